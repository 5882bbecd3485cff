//! Cache Module
//!
//! Keyed object cache with TTL expiry, LRU and memory-budget eviction,
//! snapshot persistence and hit-rate telemetry.

mod entry;
mod eviction;
mod lru;
mod snapshot;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use eviction::{eviction_score, EvictionReason};
pub use lru::LruTracker;
pub use snapshot::SNAPSHOT_STORE;
pub use stats::CacheStats;
pub use store::{ObjectCache, SharedObjectCache};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
