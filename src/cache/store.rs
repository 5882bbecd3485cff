//! Object Cache Module
//!
//! Keyed store for API-derived values combining TTL expiry, LRU capacity
//! eviction, memory-budget eviction and best-effort snapshot persistence.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::eviction::{select_lru_victim, select_memory_victim, EvictionReason};
use crate::cache::snapshot::SnapshotStore;
use crate::cache::stats::StatsCounters;
use crate::cache::{current_timestamp_ms, CacheEntry, CacheStats, LruTracker, MAX_KEY_LENGTH};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::persistence::{MemoryAdapter, PersistenceAdapter};

/// Object cache shared between application code and the TTL sweeper.
pub type SharedObjectCache<V> = Arc<RwLock<ObjectCache<V>>>;

// == Object Cache ==
/// Entry store with hybrid eviction.
///
/// Mutating calls take `&mut self`; share it behind [`SharedObjectCache`].
pub struct ObjectCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    lru: LruTracker,
    counters: StatsCounters,
    config: CacheConfig<V>,
    snapshot: Option<SnapshotStore>,
}

impl<V> ObjectCache<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    // == Constructor ==
    /// Creates a cache. When persistence is enabled the snapshot lives in an
    /// in-process [`MemoryAdapter`]; use [`ObjectCache::with_adapter`] for a durable one.
    pub fn new(config: CacheConfig<V>) -> Self {
        Self::with_adapter(config, Arc::new(MemoryAdapter::new()))
    }

    /// Creates a cache backed by `adapter` and re-admits any snapshot entries
    /// that are still within TTL.
    pub fn with_adapter(config: CacheConfig<V>, adapter: Arc<dyn PersistenceAdapter>) -> Self {
        let mut cache = Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            counters: StatsCounters::new(),
            config,
            snapshot: None,
        };

        if cache.config.persistence_enabled {
            match SnapshotStore::open(adapter, cache.config.persistence_key.clone()) {
                Ok(store) => {
                    cache.snapshot = Some(store);
                    cache.restore();
                }
                Err(err) => cache.report(err),
            }
        }

        cache
    }

    /// Wraps a new cache for sharing across tasks.
    pub fn shared(config: CacheConfig<V>) -> SharedObjectCache<V> {
        Arc::new(RwLock::new(Self::new(config)))
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// Evicts the least recently used entry when a new key arrives at capacity,
    /// then evicts by score until the memory budget holds. The entry just
    /// written is never chosen, so a single oversized value stays resident.
    pub fn set(&mut self, key: impl Into<String>, value: V) -> Result<()> {
        let key = key.into();
        validate_key(&key)?;
        let size_bytes = serde_json::to_vec(&value)?.len();

        if self.entries.remove(&key).is_none() && self.entries.len() >= self.config.max_entries {
            if let Some(victim) = select_lru_victim(&self.lru) {
                self.evict(&victim, EvictionReason::Capacity);
            }
        }

        self.entries
            .insert(key.clone(), CacheEntry::new(value, size_bytes));
        self.lru.touch(&key);

        let now = current_timestamp_ms();
        while self.memory_usage() > self.config.max_memory_bytes {
            match select_memory_victim(&self.entries, &self.lru, now, Some(&key)) {
                Some(victim) => self.evict(&victim, EvictionReason::Memory),
                None => break,
            }
        }

        self.persist();
        Ok(())
    }

    // == Get ==
    /// Returns a live value, counting the request as a hit or miss.
    ///
    /// An expired entry found here is removed and counted as a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let ttl_ms = self.config.ttl_ms();
        let expired = match self.entries.get_mut(key) {
            None => {
                self.counters.record_miss();
                return None;
            }
            Some(entry) if entry.is_expired(ttl_ms) => true,
            Some(entry) => {
                entry.record_access();
                let value = entry.value.clone();
                self.counters.record_hit();
                self.lru.touch(key);
                return Some(value);
            }
        };

        if expired {
            self.evict(key, EvictionReason::Expired);
        }
        self.counters.record_miss();
        None
    }

    // == Has ==
    /// True when a live entry exists. Touches neither stats nor recency.
    pub fn has(&self, key: &str) -> bool {
        let ttl_ms = self.config.ttl_ms();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(ttl_ms))
    }

    // == Delete ==
    /// Removes `key`. Returns false when nothing was stored; never errors.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_none() {
            return false;
        }
        self.lru.remove(key);
        self.persist();
        true
    }

    // == Clear ==
    /// Drops every entry, resets stats and removes the persisted snapshot.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.counters.reset();

        if let Some(snapshot) = &self.snapshot {
            if let Err(err) = snapshot.remove() {
                self.report(err);
            }
        }
    }

    // == Batch Operations ==
    /// Reads each key independently, in order.
    pub fn mget<K: AsRef<str>>(&mut self, keys: &[K]) -> Vec<Option<V>> {
        keys.iter().map(|key| self.get(key.as_ref())).collect()
    }

    /// Writes each pair independently; one rejected key does not stop the rest.
    pub fn mset<K, I>(&mut self, pairs: I) -> Vec<Result<()>>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        pairs
            .into_iter()
            .map(|(key, value)| self.set(key, value))
            .collect()
    }

    // == Cleanup Expired ==
    /// Removes every expired entry, notifying `on_evict` for each.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired = self.take_expired();
        if let Some(on_evict) = &self.config.on_evict {
            for (key, value) in &expired {
                on_evict(key, value);
            }
        }
        expired.len()
    }

    /// Removes every expired entry and hands them back without calling
    /// `on_evict`, so a caller holding the shared lock can notify after
    /// releasing it. Removals still count as evictions.
    pub fn take_expired(&mut self) -> Vec<(String, V)> {
        let ttl_ms = self.config.ttl_ms();
        let now = current_timestamp_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now, ttl_ms))
            .map(|(key, _)| key.clone())
            .collect();

        expired_keys
            .into_iter()
            .filter_map(|key| {
                let entry = self.remove_evicted(&key, EvictionReason::Expired)?;
                Some((key, entry.value))
            })
            .collect()
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        CacheStats::compute(&self.counters, self.entries.len(), self.memory_usage())
    }

    /// Sum of entry sizes, recomputed on every call.
    pub fn memory_usage(&self) -> usize {
        self.entries.values().map(|entry| entry.size_bytes).sum()
    }

    /// Live keys, least recently used first.
    pub fn keys(&self) -> Vec<String> {
        let ttl_ms = self.config.ttl_ms();
        self.lru
            .iter_oldest_first()
            .filter(|key| {
                self.entries
                    .get(*key)
                    .is_some_and(|entry| !entry.is_expired(ttl_ms))
            })
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn config(&self) -> &CacheConfig<V> {
        &self.config
    }

    /// Interval the TTL sweeper runs at: half the TTL, at least one millisecond.
    pub fn sweep_interval(&self) -> Duration {
        (self.config.ttl / 2).max(Duration::from_millis(1))
    }

    // == Internals ==
    fn evict(&mut self, key: &str, reason: EvictionReason) {
        let Some(entry) = self.remove_evicted(key, reason) else {
            return;
        };
        if let Some(on_evict) = &self.config.on_evict {
            on_evict(key, &entry.value);
        }
    }

    fn remove_evicted(&mut self, key: &str, reason: EvictionReason) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.counters.record_eviction();
        debug!(key, ?reason, size_bytes = entry.size_bytes, "Evicted cache entry");
        Some(entry)
    }

    fn persist(&self) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        let entries = self
            .lru
            .iter_oldest_first()
            .filter_map(|key| self.entries.get_key_value(key))
            .map(|(key, entry)| (key.as_str(), entry));

        if let Err(err) = snapshot.save(entries) {
            self.report(err);
        }
    }

    fn restore(&mut self) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        let loaded = match snapshot.load::<V>() {
            Ok(Some(entries)) => entries,
            Ok(None) => return,
            Err(err) => {
                self.report(err);
                return;
            }
        };

        let ttl_ms = self.config.ttl_ms();
        let now = current_timestamp_ms();
        let total = loaded.len();
        for (key, entry) in loaded {
            if entry.is_expired_at(now, ttl_ms) {
                continue;
            }
            self.entries.insert(key.clone(), entry);
            self.lru.touch(&key);
        }

        while self.entries.len() > self.config.max_entries {
            match select_lru_victim(&self.lru) {
                Some(victim) => self.evict(&victim, EvictionReason::Capacity),
                None => break,
            }
        }
        while self.memory_usage() > self.config.max_memory_bytes {
            match select_memory_victim(&self.entries, &self.lru, now, None) {
                Some(victim) => self.evict(&victim, EvictionReason::Memory),
                None => break,
            }
        }

        info!(
            "Restored {} of {} cached entries from snapshot",
            self.entries.len(),
            total
        );
    }

    fn report(&self, err: CacheError) {
        warn!("Object cache persistence degraded: {}", err);
        if let Some(on_error) = &self.config.on_error {
            on_error(&err);
        }
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidKey(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
