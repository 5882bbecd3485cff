//! TTL Sweeper Task
//!
//! Background task that proactively removes expired object cache entries.

use serde::{de::DeserializeOwned, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedObjectCache;

/// Spawns a task that sweeps `cache` every half TTL.
///
/// Each sweep holds the write lock for the duration of one scan, so sweeps
/// never overlap with each other or with a `set` on the same cache.
/// `on_evict` runs after the lock is released and may use the cache.
/// Abort the returned handle to stop sweeping.
///
/// # Example
/// ```ignore
/// let cache = ObjectCache::shared(CacheConfig::default());
/// let sweeper = spawn_sweeper_task(cache.clone());
/// // Later, during shutdown:
/// sweeper.abort();
/// ```
pub fn spawn_sweeper_task<V>(cache: SharedObjectCache<V>) -> JoinHandle<()>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let interval = cache.read().await.sweep_interval();
        info!("Starting TTL sweeper with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let (expired, on_evict) = {
                let mut cache_guard = cache.write().await;
                (cache_guard.take_expired(), cache_guard.config().on_evict.clone())
            };
            let removed = expired.len();
            if let Some(on_evict) = on_evict {
                for (key, value) in &expired {
                    on_evict(key, value);
                }
            }

            if removed > 0 {
                info!("TTL sweep: removed {} expired entries", removed);
            } else {
                debug!("TTL sweep: no expired entries found");
            }
        }
    })
}
