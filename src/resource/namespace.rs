//! Namespaces: named, versioned partitions of stored responses.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::Response;

/// Logical partition a route stores into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamespaceKind {
    /// Install-time core assets and long-lived static files
    Static,
    /// Anything routed by the same-origin/cross-origin defaults
    Dynamic,
    Api,
    Images,
}

impl NamespaceKind {
    pub const ALL: [NamespaceKind; 4] = [
        NamespaceKind::Static,
        NamespaceKind::Dynamic,
        NamespaceKind::Api,
        NamespaceKind::Images,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NamespaceKind::Static => "static",
            NamespaceKind::Dynamic => "dynamic",
            NamespaceKind::Api => "api",
            NamespaceKind::Images => "images",
        }
    }
}

impl fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{prefix}-{version}-{kind}`
pub fn namespace_name(prefix: &str, version: &str, kind: NamespaceKind) -> String {
    format!("{}-{}-{}", prefix, version, kind)
}

/// True for namespaces this application owns under a different version.
///
/// The name is split as `{prefix}-{version}-{kind}` by stripping a known kind
/// suffix, and the version must match exactly. Names without the prefix
/// belong to someone else and are never stale.
pub fn is_stale_namespace(name: &str, prefix: &str, version: &str) -> bool {
    let Some(rest) = name
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return false;
    };

    let current = NamespaceKind::ALL.iter().any(|kind| {
        rest.strip_suffix(kind.as_str())
            .and_then(|rest| rest.strip_suffix('-'))
            == Some(version)
    });
    !current
}

/// Durable home of namespaces. Lookups are keyed by [`crate::models::Request::cache_key`].
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Creates the namespace if it does not exist.
    async fn open(&self, namespace: &str) -> Result<()>;

    async fn lookup(&self, namespace: &str, key: &str) -> Result<Option<Response>>;

    /// Stores a response, creating the namespace on first use.
    async fn put(&self, namespace: &str, key: &str, response: Response) -> Result<()>;

    async fn namespaces(&self) -> Result<Vec<String>>;

    /// Returns false when the namespace did not exist.
    async fn delete_namespace(&self, namespace: &str) -> Result<bool>;
}

#[derive(Debug, Default)]
pub struct MemoryResponseStore {
    namespaces: RwLock<HashMap<String, HashMap<String, Response>>>,
}

impl MemoryResponseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResponseStore for MemoryResponseStore {
    async fn open(&self, namespace: &str) -> Result<()> {
        self.namespaces
            .write()
            .await
            .entry(namespace.to_string())
            .or_default();
        Ok(())
    }

    async fn lookup(&self, namespace: &str, key: &str) -> Result<Option<Response>> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .get(namespace)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn put(&self, namespace: &str, key: &str, response: Response) -> Result<()> {
        self.namespaces
            .write()
            .await
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), response);
        Ok(())
    }

    async fn namespaces(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.namespaces.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<bool> {
        Ok(self.namespaces.write().await.remove(namespace).is_some())
    }
}
