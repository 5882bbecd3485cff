//! Resource cache: routes intercepted GETs through the strategy executors.

use std::sync::Arc;

use tracing::debug;

use crate::config::ResourceCacheConfig;
use crate::error::Result;
use crate::models::{Method, Request, Response};
use crate::resource::{
    namespace_name, ActivationReport, LifecycleState, NamespaceKind, NamespaceLifecycle,
    OfflineFallback, Route, RouteTable, ResponseStore, StrategyExecutor,
};
use crate::transport::Transport;

pub struct ResourceCache {
    config: Arc<ResourceCacheConfig>,
    routes: RouteTable,
    executor: StrategyExecutor,
    lifecycle: NamespaceLifecycle,
}

impl ResourceCache {
    /// Builds a resource cache with the default route table.
    pub fn new(
        config: ResourceCacheConfig,
        store: Arc<dyn ResponseStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let routes = RouteTable::with_defaults(&config);
        let config = Arc::new(config);

        let fallback = OfflineFallback {
            namespace: namespace_name(&config.prefix, &config.version, NamespaceKind::Static),
            document_key: config
                .resolve(&config.offline_document)
                .map(String::from)
                .unwrap_or_else(|_| config.origin.to_string()),
        };
        let executor = StrategyExecutor::new(store.clone(), transport.clone(), fallback);
        let lifecycle = NamespaceLifecycle::new(config.clone(), store, transport);

        Self {
            config,
            routes,
            executor,
            lifecycle,
        }
    }

    /// Replaces the route table.
    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    pub fn config(&self) -> &ResourceCacheConfig {
        &self.config
    }

    /// Full name of a namespace under the active version.
    pub fn namespace(&self, kind: NamespaceKind) -> String {
        namespace_name(&self.config.prefix, &self.config.version, kind)
    }

    /// Strategy and namespace for `request`, or `None` when it bypasses the
    /// cache (non-GET or non-network scheme).
    pub fn route(&self, request: &Request) -> Option<Route> {
        if request.method != Method::Get || !request.is_network_scheme() {
            return None;
        }
        Some(self.routes.route(&request.url))
    }

    // == Fetch ==
    /// Serves an intercepted request.
    ///
    /// `Ok(None)` means the request is not intercepted and the host should
    /// perform it untouched: before activation, for non-GET methods and for
    /// non-network schemes.
    pub async fn handle_fetch(&self, request: &Request) -> Result<Option<Response>> {
        if !self.lifecycle.controls_clients() {
            return Ok(None);
        }
        let Some(route) = self.route(request) else {
            debug!("Bypassing {} {}", request.method, request.url);
            return Ok(None);
        };

        let namespace = self.namespace(route.namespace);
        self.executor
            .execute(route.strategy, &namespace, request)
            .await
            .map(Some)
    }

    // == Lifecycle ==
    pub async fn install(&self) -> Result<Option<ActivationReport>> {
        self.lifecycle.install().await
    }

    pub async fn activate(&self) -> Result<ActivationReport> {
        self.lifecycle.activate().await
    }

    pub async fn skip_waiting(&self) -> Result<Option<ActivationReport>> {
        self.lifecycle.skip_waiting().await
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn executor(&self) -> &StrategyExecutor {
        &self.executor
    }

    /// Waits for outstanding stale-while-revalidate refreshes.
    pub async fn flush_revalidations(&self) {
        self.executor.flush_revalidations().await;
    }
}
