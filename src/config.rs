//! Configuration Module
//!
//! Handles cache configuration, loaded from environment variables or built in code.

use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::CacheError;
use crate::queue::ReplayPolicy;

/// Called with the key and value of every entry removed by eviction or expiry.
pub type EvictCallback<V> = Arc<dyn Fn(&str, &V) + Send + Sync>;

/// Called with recoverable failures (persistence reads and writes).
pub type ErrorCallback = Arc<dyn Fn(&CacheError) + Send + Sync>;

const DEFAULT_MAX_ENTRIES: usize = 100;
const DEFAULT_TTL_MS: u64 = 5 * 60 * 1000;
const DEFAULT_MAX_MEMORY_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_PERSISTENCE_KEY: &str = "memshare-object-cache";

/// Object cache configuration. Immutable once the cache is built.
pub struct CacheConfig<V> {
    /// Maximum number of entries held at once
    pub max_entries: usize,
    /// Maximum age of an entry, measured from its creation
    pub ttl: Duration,
    /// Approximate memory budget across all entries
    pub max_memory_bytes: usize,
    /// Whether snapshots are written to and restored from a durable store
    pub persistence_enabled: bool,
    /// Key the snapshot is stored under
    pub persistence_key: String,
    /// Runs inside `set`, `get` and `cleanup_expired`, so under whatever lock
    /// the caller holds on a [`crate::cache::SharedObjectCache`]; it must not
    /// lock that same cache. The TTL sweeper calls it after releasing the lock.
    pub on_evict: Option<EvictCallback<V>>,
    pub on_error: Option<ErrorCallback>,
}

impl<V> CacheConfig<V> {
    /// Creates a config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` - Maximum entries (default: 100)
    /// - `CACHE_TTL_MS` - TTL in milliseconds (default: 300000)
    /// - `CACHE_MAX_MEMORY_BYTES` - Memory budget (default: 5 MiB)
    /// - `CACHE_PERSISTENCE` - `true`/`1` to enable snapshots (default: off)
    /// - `CACHE_PERSISTENCE_KEY` - Snapshot key (default: `memshare-object-cache`)
    pub fn from_env() -> Self {
        Self {
            max_entries: parse_env("CACHE_MAX_ENTRIES").unwrap_or(DEFAULT_MAX_ENTRIES),
            ttl: Duration::from_millis(parse_env("CACHE_TTL_MS").unwrap_or(DEFAULT_TTL_MS)),
            max_memory_bytes: parse_env("CACHE_MAX_MEMORY_BYTES")
                .unwrap_or(DEFAULT_MAX_MEMORY_BYTES),
            persistence_enabled: env::var("CACHE_PERSISTENCE")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            persistence_key: env::var("CACHE_PERSISTENCE_KEY")
                .unwrap_or_else(|_| DEFAULT_PERSISTENCE_KEY.to_string()),
            on_evict: None,
            on_error: None,
        }
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_memory_bytes(mut self, bytes: usize) -> Self {
        self.max_memory_bytes = bytes;
        self
    }

    /// Enables snapshot persistence under the given key.
    pub fn with_persistence(mut self, key: impl Into<String>) -> Self {
        self.persistence_enabled = true;
        self.persistence_key = key.into();
        self
    }

    pub fn with_on_evict(mut self, callback: impl Fn(&str, &V) + Send + Sync + 'static) -> Self {
        self.on_evict = Some(Arc::new(callback));
        self
    }

    pub fn with_on_error(
        mut self,
        callback: impl Fn(&CacheError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// TTL in whole milliseconds, as compared against entry timestamps.
    pub fn ttl_ms(&self) -> u64 {
        self.ttl.as_millis() as u64
    }
}

impl<V> Default for CacheConfig<V> {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            ttl: Duration::from_millis(DEFAULT_TTL_MS),
            max_memory_bytes: DEFAULT_MAX_MEMORY_BYTES,
            persistence_enabled: false,
            persistence_key: DEFAULT_PERSISTENCE_KEY.to_string(),
            on_evict: None,
            on_error: None,
        }
    }
}

impl<V> Clone for CacheConfig<V> {
    fn clone(&self) -> Self {
        Self {
            max_entries: self.max_entries,
            ttl: self.ttl,
            max_memory_bytes: self.max_memory_bytes,
            persistence_enabled: self.persistence_enabled,
            persistence_key: self.persistence_key.clone(),
            on_evict: self.on_evict.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<V> fmt::Debug for CacheConfig<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("max_entries", &self.max_entries)
            .field("ttl", &self.ttl)
            .field("max_memory_bytes", &self.max_memory_bytes)
            .field("persistence_enabled", &self.persistence_enabled)
            .field("persistence_key", &self.persistence_key)
            .field("on_evict", &self.on_evict.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

const DEFAULT_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_PREFIX: &str = "memshare";
const DEFAULT_VERSION: &str = "v1";
const DEFAULT_SYNC_TAG: &str = "sync-offline-actions";

/// Core assets seeded into the static namespace on install.
pub const DEFAULT_STATIC_MANIFEST: &[&str] = &[
    "/",
    "/index.html",
    "/manifest.json",
    "/icons/icon-192x192.png",
    "/icons/icon-512x512.png",
];

/// Resource cache configuration.
#[derive(Debug, Clone)]
pub struct ResourceCacheConfig {
    /// Origin the application is served from; decides same-origin defaults
    pub origin: Url,
    /// Prefix shared by every namespace this application owns
    pub prefix: String,
    /// Active version tag
    pub version: String,
    /// Paths (relative to `origin`) fetched into the static namespace on install
    pub static_manifest: Vec<String>,
    /// Path of the document served to navigations when offline
    pub offline_document: String,
    /// Background-sync tag that triggers offline queue replay
    pub sync_tag: String,
    pub replay_policy: ReplayPolicy,
}

impl ResourceCacheConfig {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            ..Self::default()
        }
    }

    /// Creates a config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `RESOURCE_CACHE_ORIGIN` - Application origin (default: `http://localhost:3000`)
    /// - `RESOURCE_CACHE_PREFIX` - Namespace prefix (default: `memshare`)
    /// - `RESOURCE_CACHE_VERSION` - Active version tag (default: `v1`)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            origin: env::var("RESOURCE_CACHE_ORIGIN")
                .ok()
                .and_then(|v| Url::parse(&v).ok())
                .unwrap_or(defaults.origin),
            prefix: env::var("RESOURCE_CACHE_PREFIX").unwrap_or(defaults.prefix),
            version: env::var("RESOURCE_CACHE_VERSION").unwrap_or(defaults.version),
            ..defaults
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_static_manifest<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.static_manifest = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_replay_policy(mut self, policy: ReplayPolicy) -> Self {
        self.replay_policy = policy;
        self
    }

    /// Resolves a manifest path against the origin.
    pub fn resolve(&self, path: &str) -> std::result::Result<Url, url::ParseError> {
        self.origin.join(path)
    }
}

impl Default for ResourceCacheConfig {
    fn default() -> Self {
        Self {
            origin: Url::parse(DEFAULT_ORIGIN).expect("Default origin is a valid URL"),
            prefix: DEFAULT_PREFIX.to_string(),
            version: DEFAULT_VERSION.to_string(),
            static_manifest: DEFAULT_STATIC_MANIFEST
                .iter()
                .map(|p| p.to_string())
                .collect(),
            offline_document: "/".to_string(),
            sync_tag: DEFAULT_SYNC_TAG.to_string(),
            replay_policy: ReplayPolicy::default(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_default() {
        let config: CacheConfig<String> = CacheConfig::default();
        assert_eq!(config.max_entries, 100);
        assert_eq!(config.ttl_ms(), 300_000);
        assert_eq!(config.max_memory_bytes, 5 * 1024 * 1024);
        assert!(!config.persistence_enabled);
        assert!(config.on_evict.is_none());
    }

    #[test]
    fn test_cache_config_from_env_defaults() {
        env::remove_var("CACHE_MAX_ENTRIES");
        env::remove_var("CACHE_TTL_MS");
        env::remove_var("CACHE_MAX_MEMORY_BYTES");
        env::remove_var("CACHE_PERSISTENCE");
        env::remove_var("CACHE_PERSISTENCE_KEY");

        let config: CacheConfig<String> = CacheConfig::from_env();
        assert_eq!(config.max_entries, 100);
        assert_eq!(config.ttl_ms(), 300_000);
        assert!(!config.persistence_enabled);
        assert_eq!(config.persistence_key, "memshare-object-cache");
    }

    #[test]
    fn test_cache_config_builders() {
        let config: CacheConfig<String> = CacheConfig::default()
            .with_max_entries(2)
            .with_ttl(Duration::from_millis(50))
            .with_persistence("snap")
            .with_on_evict(|_, _| {});

        assert_eq!(config.max_entries, 2);
        assert_eq!(config.ttl_ms(), 50);
        assert!(config.persistence_enabled);
        assert_eq!(config.persistence_key, "snap");
        assert!(config.on_evict.is_some());
        assert!(format!("{:?}", config).contains("on_evict: true"));
    }

    #[test]
    fn test_resource_config_default() {
        let config = ResourceCacheConfig::default();
        assert_eq!(config.origin.as_str(), "http://localhost:3000/");
        assert_eq!(config.prefix, "memshare");
        assert_eq!(config.version, "v1");
        assert_eq!(config.static_manifest.len(), DEFAULT_STATIC_MANIFEST.len());
        assert_eq!(config.replay_policy, ReplayPolicy::ClearAll);
    }

    #[test]
    fn test_resource_config_resolve() {
        let config = ResourceCacheConfig::new(Url::parse("https://memories.test").unwrap());
        let url = config.resolve("/manifest.json").unwrap();
        assert_eq!(url.as_str(), "https://memories.test/manifest.json");
    }
}
