//! Cache Entry Module
//!
//! Defines a single object cache entry and its access bookkeeping.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A stored value plus the metadata eviction and expiry decisions read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Last successful read or write (Unix milliseconds)
    pub last_accessed_at: u64,
    /// Number of successful reads since creation
    pub access_count: u64,
    /// Approximate serialized size of the value
    pub size_bytes: usize,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a fresh entry stamped with the current time.
    pub fn new(value: V, size_bytes: usize) -> Self {
        let now = current_timestamp_ms();
        Self {
            value,
            created_at: now,
            last_accessed_at: now,
            access_count: 0,
            size_bytes,
        }
    }

    // == Is Expired ==
    /// An entry is expired once strictly more than `ttl_ms` has passed since creation.
    ///
    /// Reads do not extend the lifetime; only a new `set` does.
    pub fn is_expired(&self, ttl_ms: u64) -> bool {
        self.is_expired_at(current_timestamp_ms(), ttl_ms)
    }

    pub fn is_expired_at(&self, now: u64, ttl_ms: u64) -> bool {
        now.saturating_sub(self.created_at) > ttl_ms
    }

    // == Record Access ==
    /// Bumps the access counter and recency stamp after a hit.
    pub fn record_access(&mut self) {
        self.access_count += 1;
        self.last_accessed_at = current_timestamp_ms();
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
