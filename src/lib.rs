//! Memshare Cache - client-side caching for the memory-sharing app
//!
//! Two independent caches sharing one vocabulary:
//! - [`cache::ObjectCache`]: keyed values with TTL expiry, LRU and
//!   memory-budget eviction, snapshot persistence and hit-rate stats.
//! - [`resource::ResourceCache`]: intercepted GETs served from versioned
//!   namespaces under cache-first, network-first, stale-while-revalidate,
//!   network-only or cache-only strategies, plus an offline write queue.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod persistence;
pub mod queue;
pub mod resource;
pub mod tasks;
pub mod telemetry;
pub mod transport;
pub mod worker;

pub use cache::{CacheStats, ObjectCache, SharedObjectCache};
pub use config::{CacheConfig, ResourceCacheConfig};
pub use error::{CacheError, Result};
pub use resource::{ResourceCache, Strategy};
pub use tasks::spawn_sweeper_task;
pub use worker::{CacheWorker, WorkerEvent};
