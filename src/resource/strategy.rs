//! Strategy Executors
//!
//! The five ways a routed request is served from a namespace and/or the network.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::{CacheError, Result};
use crate::models::{Request, Response};
use crate::resource::ResponseStore;
use crate::transport::Transport;

/// Served to navigations that fail with nothing cached and no stored offline document.
pub const OFFLINE_FALLBACK_BODY: &str = "<!DOCTYPE html>\
<html><head><meta charset=\"utf-8\"><title>Offline</title></head>\
<body><h1>You are offline</h1><p>Your memories will be back once the connection returns.</p></body></html>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Cached copy if present, else network (stored on success)
    CacheFirst,
    /// Network (stored on success), else cached copy, else offline document for navigations
    NetworkFirst,
    /// Cached copy now plus a background refresh; network only when nothing is cached
    StaleWhileRevalidate,
    /// Straight to the network, never touching a namespace
    NetworkOnly,
    /// Cached copy or [`CacheError::NotCached`], never the network
    CacheOnly,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache-first",
            Strategy::NetworkFirst => "network-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
            Strategy::NetworkOnly => "network-only",
            Strategy::CacheOnly => "cache-only",
        }
    }
}

/// Where network-first finds the placeholder document for failed navigations.
#[derive(Debug, Clone)]
pub struct OfflineFallback {
    pub namespace: String,
    pub document_key: String,
}

/// Runs strategies against a response store and a transport.
///
/// Clones share the store, transport and the set of background refreshes.
#[derive(Clone)]
pub struct StrategyExecutor {
    store: Arc<dyn ResponseStore>,
    transport: Arc<dyn Transport>,
    fallback: Arc<OfflineFallback>,
    revalidations: Arc<Mutex<JoinSet<()>>>,
}

impl StrategyExecutor {
    pub fn new(
        store: Arc<dyn ResponseStore>,
        transport: Arc<dyn Transport>,
        fallback: OfflineFallback,
    ) -> Self {
        Self {
            store,
            transport,
            fallback: Arc::new(fallback),
            revalidations: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    pub async fn execute(
        &self,
        strategy: Strategy,
        namespace: &str,
        request: &Request,
    ) -> Result<Response> {
        debug!("{} {} via {} in {}", request.method, request.url, strategy.as_str(), namespace);
        match strategy {
            Strategy::CacheFirst => self.cache_first(namespace, request).await,
            Strategy::NetworkFirst => self.network_first(namespace, request).await,
            Strategy::StaleWhileRevalidate => {
                self.stale_while_revalidate(namespace, request).await
            }
            Strategy::NetworkOnly => self.transport.fetch(request).await,
            Strategy::CacheOnly => self.cache_only(namespace, request).await,
        }
    }

    async fn cache_first(&self, namespace: &str, request: &Request) -> Result<Response> {
        if let Some(cached) = self.lookup(namespace, request).await {
            return Ok(cached);
        }

        let response = self.transport.fetch(request).await?;
        self.store_if_ok(namespace, request, &response).await;
        Ok(response)
    }

    async fn network_first(&self, namespace: &str, request: &Request) -> Result<Response> {
        let err = match self.transport.fetch(request).await {
            Ok(response) => {
                self.store_if_ok(namespace, request, &response).await;
                return Ok(response);
            }
            Err(err) => err,
        };

        if let Some(cached) = self.lookup(namespace, request).await {
            debug!("Network failed for {}, serving cached copy", request.url);
            return Ok(cached);
        }
        if request.is_navigation() {
            warn!("Navigation to {} failed offline, serving placeholder", request.url);
            return Ok(self.offline_document(request).await);
        }
        Err(err)
    }

    /// A cached copy is returned without waiting on the network. The refresh
    /// runs as a detached task; its only observable effect is the stored value.
    async fn stale_while_revalidate(&self, namespace: &str, request: &Request) -> Result<Response> {
        if let Some(cached) = self.lookup(namespace, request).await {
            self.spawn_revalidation(namespace, request);
            return Ok(cached);
        }

        let response = self.transport.fetch(request).await?;
        self.store_if_ok(namespace, request, &response).await;
        Ok(response)
    }

    async fn cache_only(&self, namespace: &str, request: &Request) -> Result<Response> {
        self.lookup(namespace, request)
            .await
            .ok_or_else(|| CacheError::NotCached(request.cache_key()))
    }

    fn spawn_revalidation(&self, namespace: &str, request: &Request) {
        let executor = self.clone();
        let namespace = namespace.to_string();
        let request = request.clone();

        let mut tasks = self
            .revalidations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while tasks.try_join_next().is_some() {}

        tasks.spawn(async move {
            match executor.transport.fetch(&request).await {
                Ok(response) => executor.store_if_ok(&namespace, &request, &response).await,
                Err(err) => debug!("Background refresh of {} failed: {}", request.url, err),
            }
        });
    }

    /// Waits for every background refresh started so far.
    ///
    /// Request handling never calls this; it exists for shutdown and tests.
    pub async fn flush_revalidations(&self) {
        let mut tasks = std::mem::take(
            &mut *self
                .revalidations
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                warn!("Background refresh task aborted: {}", err);
            }
        }
    }

    /// Store failures degrade to a miss.
    async fn lookup(&self, namespace: &str, request: &Request) -> Option<Response> {
        match self.store.lookup(namespace, &request.cache_key()).await {
            Ok(found) => found,
            Err(err) => {
                warn!("Lookup in {} failed: {}", namespace, err);
                None
            }
        }
    }

    async fn store_if_ok(&self, namespace: &str, request: &Request, response: &Response) {
        if !response.ok() {
            return;
        }
        if let Err(err) = self
            .store
            .put(namespace, &request.cache_key(), response.clone())
            .await
        {
            warn!("Storing {} in {} failed: {}", request.url, namespace, err);
        }
    }

    async fn offline_document(&self, request: &Request) -> Response {
        let stored = self
            .store
            .lookup(&self.fallback.namespace, &self.fallback.document_key)
            .await
            .ok()
            .flatten();

        stored.unwrap_or_else(|| {
            Response::new(request.url.as_str(), 503, OFFLINE_FALLBACK_BODY)
                .with_header("Content-Type", "text/html; charset=utf-8")
        })
    }
}
