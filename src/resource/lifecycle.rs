//! Namespace Lifecycle
//!
//! Install seeds the static namespace; activate purges namespaces left by
//! other versions and takes control of open clients. A skip-waiting signal
//! activates as soon as install has finished.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::config::ResourceCacheConfig;
use crate::error::{CacheError, Result};
use crate::models::{Method, Request, Response};
use crate::resource::{is_stale_namespace, namespace_name, NamespaceKind, ResponseStore};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Created, install not attempted or failed
    Parsed,
    Installing,
    /// Static namespace seeded; waiting for activation
    Installed,
    Activating,
    /// Controls clients and intercepts their requests
    Activated,
}

/// Namespaces removed and kept by one activation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    pub deleted: Vec<String>,
    pub retained: Vec<String>,
}

pub struct NamespaceLifecycle {
    config: Arc<ResourceCacheConfig>,
    store: Arc<dyn ResponseStore>,
    transport: Arc<dyn Transport>,
    state: Mutex<LifecycleState>,
    skip_waiting: AtomicBool,
    controlling: AtomicBool,
}

impl NamespaceLifecycle {
    pub fn new(
        config: Arc<ResourceCacheConfig>,
        store: Arc<dyn ResponseStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            store,
            transport,
            state: Mutex::new(LifecycleState::Parsed),
            skip_waiting: AtomicBool::new(false),
            controlling: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True once activation has claimed the open clients.
    pub fn controls_clients(&self) -> bool {
        self.controlling.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: LifecycleState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
        debug!(?state, "Lifecycle transition");
    }

    // == Install ==
    /// Fetches every manifest asset and stores them in the static namespace.
    ///
    /// All-or-nothing: if any asset fails to fetch nothing is stored and the
    /// lifecycle returns to `Parsed`. Activates immediately only when a
    /// skip-waiting signal has been received.
    pub async fn install(&self) -> Result<Option<ActivationReport>> {
        self.set_state(LifecycleState::Installing);
        let namespace = self.static_namespace();

        let seeded = match self.fetch_manifest().await {
            Ok(seeded) => seeded,
            Err(err) => {
                warn!("Install failed: {}", err);
                self.set_state(LifecycleState::Parsed);
                return Err(err);
            }
        };

        self.store.open(&namespace).await?;
        let count = seeded.len();
        for (key, response) in seeded {
            self.store.put(&namespace, &key, response).await?;
        }
        self.set_state(LifecycleState::Installed);
        info!("Installed {} core assets into {}", count, namespace);

        if self.skip_waiting.load(Ordering::SeqCst) {
            return self.activate().await.map(Some);
        }
        Ok(None)
    }

    async fn fetch_manifest(&self) -> Result<Vec<(String, Response)>> {
        let mut seeded = Vec::with_capacity(self.config.static_manifest.len());
        for path in &self.config.static_manifest {
            let url = self
                .config
                .resolve(path)
                .map_err(|err| CacheError::InvalidRequest(format!("{}: {}", path, err)))?;
            let request = Request::new(Method::Get, url);
            let response = self.transport.fetch(&request).await?;
            if !response.ok() {
                return Err(CacheError::Network(format!(
                    "{} answered {}",
                    request.url, response.status
                )));
            }
            seeded.push((request.cache_key(), response));
        }
        Ok(seeded)
    }

    // == Activate ==
    /// Deletes namespaces owned by this application under another version,
    /// then claims every open client.
    pub async fn activate(&self) -> Result<ActivationReport> {
        self.set_state(LifecycleState::Activating);
        let mut report = ActivationReport::default();

        for name in self.store.namespaces().await? {
            if is_stale_namespace(&name, &self.config.prefix, &self.config.version) {
                self.store.delete_namespace(&name).await?;
                info!("Deleted stale namespace {}", name);
                report.deleted.push(name);
            } else {
                report.retained.push(name);
            }
        }

        self.controlling.store(true, Ordering::SeqCst);
        self.set_state(LifecycleState::Activated);
        info!(
            "Activated version {}; now controlling clients",
            self.config.version
        );
        Ok(report)
    }

    // == Skip Waiting ==
    /// Forces activation without waiting for the normal handoff. If install is
    /// still pending the signal is remembered and honoured when it finishes.
    pub async fn skip_waiting(&self) -> Result<Option<ActivationReport>> {
        self.skip_waiting.store(true, Ordering::SeqCst);
        match self.state() {
            LifecycleState::Installed => self.activate().await.map(Some),
            _ => Ok(None),
        }
    }

    pub fn static_namespace(&self) -> String {
        namespace_name(
            &self.config.prefix,
            &self.config.version,
            NamespaceKind::Static,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MemoryResponseStore;
    use crate::transport::ScriptedTransport;
    use url::Url;

    const ORIGIN: &str = "https://memories.test";

    fn config(version: &str) -> Arc<ResourceCacheConfig> {
        Arc::new(
            ResourceCacheConfig::new(Url::parse(ORIGIN).unwrap())
                .with_version(version)
                .with_static_manifest(["/", "/manifest.json"]),
        )
    }

    fn scripted_manifest() -> Arc<ScriptedTransport> {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond("https://memories.test/", 200, "<html>shell</html>");
        transport.respond("https://memories.test/manifest.json", 200, "{}");
        transport
    }

    #[tokio::test]
    async fn test_install_seeds_static_namespace() {
        let store = Arc::new(MemoryResponseStore::new());
        let lifecycle = NamespaceLifecycle::new(config("v1"), store.clone(), scripted_manifest());

        let activated = lifecycle.install().await.unwrap();

        assert!(activated.is_none(), "install waits for activation");
        assert_eq!(lifecycle.state(), LifecycleState::Installed);
        assert!(!lifecycle.controls_clients());
        let shell = store
            .lookup("memshare-v1-static", "https://memories.test/")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(shell.text(), "<html>shell</html>");
    }

    #[tokio::test]
    async fn test_install_is_all_or_nothing() {
        let store = Arc::new(MemoryResponseStore::new());
        let transport = scripted_manifest();
        transport.respond("https://memories.test/manifest.json", 404, "");
        let lifecycle = NamespaceLifecycle::new(config("v1"), store.clone(), transport);

        assert!(lifecycle.install().await.is_err());
        assert_eq!(lifecycle.state(), LifecycleState::Parsed);
        assert!(store.namespaces().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_activate_purges_other_versions() {
        let store = Arc::new(MemoryResponseStore::new());
        for ns in ["memshare-v1-static", "memshare-v1-dynamic", "memshare-v2-static"] {
            store.open(ns).await.unwrap();
        }
        let lifecycle = NamespaceLifecycle::new(
            config("v2"),
            store.clone(),
            Arc::new(ScriptedTransport::new()),
        );

        let report = lifecycle.activate().await.unwrap();

        assert_eq!(report.deleted, vec!["memshare-v1-dynamic", "memshare-v1-static"]);
        assert_eq!(report.retained, vec!["memshare-v2-static"]);
        assert_eq!(store.namespaces().await.unwrap(), vec!["memshare-v2-static"]);
        assert!(lifecycle.controls_clients());
        assert_eq!(lifecycle.state(), LifecycleState::Activated);
    }

    #[tokio::test]
    async fn test_activate_leaves_foreign_namespaces() {
        let store = Arc::new(MemoryResponseStore::new());
        store
            .put("third-party", "k", Response::new("k", 200, ""))
            .await
            .unwrap();
        let lifecycle = NamespaceLifecycle::new(
            config("v2"),
            store.clone(),
            Arc::new(ScriptedTransport::new()),
        );

        let report = lifecycle.activate().await.unwrap();
        assert!(report.deleted.is_empty());
        assert_eq!(report.retained, vec!["third-party"]);
    }

    #[tokio::test]
    async fn test_skip_waiting_after_install() {
        let store = Arc::new(MemoryResponseStore::new());
        let lifecycle = NamespaceLifecycle::new(config("v1"), store, scripted_manifest());

        lifecycle.install().await.unwrap();
        let report = lifecycle.skip_waiting().await.unwrap();

        assert!(report.is_some());
        assert!(lifecycle.controls_clients());
    }

    #[tokio::test]
    async fn test_skip_waiting_before_install() {
        let store = Arc::new(MemoryResponseStore::new());
        let lifecycle = NamespaceLifecycle::new(config("v1"), store, scripted_manifest());

        assert!(lifecycle.skip_waiting().await.unwrap().is_none());
        assert!(!lifecycle.controls_clients());

        let report = lifecycle.install().await.unwrap();
        assert!(report.is_some(), "remembered signal activates right after install");
        assert_eq!(lifecycle.state(), LifecycleState::Activated);
    }
}
