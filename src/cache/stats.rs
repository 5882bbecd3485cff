//! Cache Statistics Module
//!
//! Hit/miss counters plus a snapshot type derived from the live store.

use serde::Serialize;

// == Stats Counters ==
/// Monotonic counters mutated by `get`; reset by `clear`.
#[derive(Debug, Clone, Default)]
pub struct StatsCounters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl StatsCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// == Cache Stats ==
/// Point-in-time view of the object cache.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CacheStats {
    /// Current number of entries
    pub size: usize,
    /// Sum of entry sizes, recomputed from the store
    pub memory_usage_bytes: usize,
    pub total_requests: u64,
    pub total_hits: u64,
    pub total_misses: u64,
    /// `total_hits / total_requests`, 0 with no requests
    pub hit_rate: f64,
    /// Entries removed by capacity, memory or expiry
    pub evictions: u64,
}

impl CacheStats {
    /// Builds a snapshot from the counters and the store's current shape.
    pub fn compute(counters: &StatsCounters, size: usize, memory_usage_bytes: usize) -> Self {
        let total_requests = counters.hits + counters.misses;
        let hit_rate = if total_requests == 0 {
            0.0
        } else {
            counters.hits as f64 / total_requests as f64
        };

        Self {
            size,
            memory_usage_bytes,
            total_requests,
            total_hits: counters.hits,
            total_misses: counters.misses,
            hit_rate,
            evictions: counters.evictions,
        }
    }
}
