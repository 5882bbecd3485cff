//! Snapshot persistence for the object cache.
//!
//! The whole store is written as one JSON document under the configured key,
//! entries ordered least to most recently used so a reload restores recency.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::cache::CacheEntry;
use crate::error::{CacheError, Result};
use crate::persistence::{PersistenceAdapter, StoreHandle};

/// Store name the object cache opens on its adapter.
pub const SNAPSHOT_STORE: &str = "object-cache";

const SNAPSHOT_FORMAT: u32 = 1;

#[derive(Serialize)]
struct SnapshotOut<'a, V> {
    format: u32,
    entries: Vec<(&'a str, &'a CacheEntry<V>)>,
}

#[derive(Deserialize)]
struct SnapshotIn<V> {
    format: u32,
    entries: Vec<(String, CacheEntry<V>)>,
}

/// Binds an adapter, an opened store and the snapshot key together.
pub struct SnapshotStore {
    adapter: Arc<dyn PersistenceAdapter>,
    handle: StoreHandle,
    key: String,
}

impl SnapshotStore {
    pub fn open(adapter: Arc<dyn PersistenceAdapter>, key: impl Into<String>) -> Result<Self> {
        let handle = adapter.open(SNAPSHOT_STORE)?;
        Ok(Self {
            adapter,
            handle,
            key: key.into(),
        })
    }

    /// Reads the stored entries, oldest first. `Ok(None)` when nothing was saved.
    ///
    /// A snapshot written in any other format is rejected like a corrupted one.
    pub fn load<V: DeserializeOwned>(&self) -> Result<Option<Vec<(String, CacheEntry<V>)>>> {
        let Some(raw) = self.adapter.get(&self.handle, &self.key)? else {
            return Ok(None);
        };
        let snapshot: SnapshotIn<V> = serde_json::from_str(&raw)?;
        if snapshot.format != SNAPSHOT_FORMAT {
            return Err(CacheError::Persistence(format!(
                "Unsupported snapshot format {} (expected {})",
                snapshot.format, SNAPSHOT_FORMAT
            )));
        }
        Ok(Some(snapshot.entries))
    }

    pub fn save<'a, V, I>(&self, entries: I) -> Result<()>
    where
        V: Serialize + 'a,
        I: IntoIterator<Item = (&'a str, &'a CacheEntry<V>)>,
    {
        let snapshot = SnapshotOut {
            format: SNAPSHOT_FORMAT,
            entries: entries.into_iter().collect(),
        };
        let raw = serde_json::to_string(&snapshot)?;
        self.adapter.put(&self.handle, &self.key, &raw)
    }

    pub fn remove(&self) -> Result<()> {
        self.adapter.delete(&self.handle, &self.key)
    }
}
