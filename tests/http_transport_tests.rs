//! Integration Tests over a real HTTP origin
//!
//! Spins up a local axum server and drives the resource cache and the
//! offline queue through `HttpTransport`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use memshare_cache::config::ResourceCacheConfig;
use memshare_cache::models::{Method, Request};
use memshare_cache::persistence::MemoryAdapter;
use memshare_cache::queue::{OfflineQueue, ReplayOutcome, ReplayPolicy};
use memshare_cache::resource::{MemoryResponseStore, NamespaceKind, ResourceCache, ResponseStore};
use memshare_cache::transport::{HttpTransport, Transport};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

// == Helper Functions ==

#[derive(Clone, Default)]
struct Origin {
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

async fn list_memories(State(origin): State<Origin>) -> Json<Value> {
    let n = origin.reads.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({ "memories": [], "served": n }))
}

async fn create_memory(State(origin): State<Origin>) -> StatusCode {
    origin.writes.fetch_add(1, Ordering::SeqCst);
    StatusCode::CREATED
}

async fn start_origin() -> (SocketAddr, Origin, JoinHandle<()>) {
    let origin = Origin::default();
    let app = Router::new()
        .route("/", get(|| async { "<html>shell</html>" }))
        .route("/api/memories", get(list_memories).post(create_memory))
        .with_state(origin.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, origin, handle)
}

/// No pooled connections, so a stopped origin is seen as unreachable.
fn transport() -> Arc<HttpTransport> {
    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap();
    Arc::new(HttpTransport::with_client(client))
}

// == Transport Tests ==

#[tokio::test]
async fn test_http_transport_get() {
    let (addr, _, server) = start_origin().await;

    let request = Request::get(&format!("http://{}/api/memories", addr)).unwrap();
    let response = transport().fetch(&request).await.unwrap();

    assert_eq!(response.status, 200);
    let body: Value = response.json().unwrap();
    assert_eq!(body["served"], 1);
    assert!(response
        .header("content-type")
        .unwrap()
        .starts_with("application/json"));

    server.abort();
}

#[tokio::test]
async fn test_http_transport_post_status() {
    let (addr, origin, server) = start_origin().await;

    let request = Request::new(
        Method::Post,
        Url::parse(&format!("http://{}/api/memories", addr)).unwrap(),
    )
    .with_header("content-type", "application/json")
    .with_body(r#"{"title":"beach"}"#);
    let response = transport().fetch(&request).await.unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(origin.writes.load(Ordering::SeqCst), 1);

    server.abort();
}

// == Resource Cache Tests ==

#[tokio::test]
async fn test_network_first_serves_cache_when_origin_stops() {
    let (addr, _, server) = start_origin().await;
    let base = format!("http://{}", addr);

    let store = Arc::new(MemoryResponseStore::new());
    let config =
        ResourceCacheConfig::new(Url::parse(&base).unwrap()).with_static_manifest(["/"]);
    let cache = ResourceCache::new(config, store.clone(), transport());

    cache.install().await.unwrap();
    cache.activate().await.unwrap();

    let static_ns = cache.namespace(NamespaceKind::Static);
    let shell = store
        .lookup(&static_ns, &format!("{}/", base))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(shell.text(), "<html>shell</html>");

    let request = Request::get(&format!("{}/api/memories", base)).unwrap();
    let online = cache.handle_fetch(&request).await.unwrap().unwrap();
    let online: Value = online.json().unwrap();
    assert_eq!(online["served"], 1);

    server.abort();
    let _ = server.await;

    let offline = cache.handle_fetch(&request).await.unwrap().unwrap();
    let offline: Value = offline.json().unwrap();
    assert_eq!(offline, online);
}

// == Offline Queue Tests ==

#[tokio::test]
async fn test_queue_replays_against_origin() {
    let (addr, origin, server) = start_origin().await;
    let url = Url::parse(&format!("http://{}/api/memories", addr)).unwrap();

    let queue = OfflineQueue::open(
        Arc::new(MemoryAdapter::new()),
        transport(),
        ReplayPolicy::RemoveDelivered,
    )
    .unwrap();
    queue
        .enqueue(Request::new(Method::Post, url.clone()).with_body("{}"))
        .unwrap();
    queue
        .enqueue(Request::new(Method::Post, url).with_body("{}"))
        .unwrap();

    match queue.replay().await.unwrap() {
        ReplayOutcome::Completed(report) => {
            assert_eq!(report.attempted, 2);
            assert_eq!(report.delivered, 2);
            assert_eq!(report.remaining, 0);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(origin.writes.load(Ordering::SeqCst), 2);
    assert!(queue.is_empty().unwrap());

    server.abort();
}
