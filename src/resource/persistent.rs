//! Response store over a [`PersistenceAdapter`], so namespaces outlive the process.
//!
//! Layout on the adapter:
//! - store `response-namespaces`, key `index`: sorted list of namespace names
//! - store `responses-{namespace}`, key `entries`: map of cache key to slot id
//! - store `responses-{namespace}`, key `{slot}`: one serialized response
//!
//! Slots are random ids so that arbitrary URLs never collide on adapters that
//! sanitize key names.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Response;
use crate::persistence::{PersistenceAdapter, StoreHandle};
use crate::resource::ResponseStore;

/// Store holding the namespace index.
pub const NAMESPACE_INDEX_STORE: &str = "response-namespaces";
const NAMESPACE_INDEX_KEY: &str = "index";
const ENTRY_INDEX_KEY: &str = "entries";

type EntryIndex = BTreeMap<String, String>;

pub struct PersistentResponseStore {
    adapter: Arc<dyn PersistenceAdapter>,
    index: StoreHandle,
    /// Held across every read-modify-write of an index
    write_lock: Mutex<()>,
}

impl PersistentResponseStore {
    pub fn new(adapter: Arc<dyn PersistenceAdapter>) -> Result<Self> {
        let index = adapter.open(NAMESPACE_INDEX_STORE)?;
        Ok(Self {
            adapter,
            index,
            write_lock: Mutex::new(()),
        })
    }

    fn namespace_store(&self, namespace: &str) -> Result<StoreHandle> {
        self.adapter.open(&format!("responses-{}", namespace))
    }

    fn read_names(&self) -> Result<BTreeSet<String>> {
        match self.adapter.get(&self.index, NAMESPACE_INDEX_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(BTreeSet::new()),
        }
    }

    fn write_names(&self, names: &BTreeSet<String>) -> Result<()> {
        let raw = serde_json::to_string(names)?;
        self.adapter.put(&self.index, NAMESPACE_INDEX_KEY, &raw)
    }

    fn read_entries(&self, handle: &StoreHandle) -> Result<EntryIndex> {
        match self.adapter.get(handle, ENTRY_INDEX_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(EntryIndex::new()),
        }
    }

    /// Adds `namespace` to the index. Caller holds `write_lock`.
    fn register(&self, namespace: &str) -> Result<StoreHandle> {
        let mut names = self.read_names()?;
        if names.insert(namespace.to_string()) {
            self.write_names(&names)?;
            debug!("Created namespace {}", namespace);
        }
        self.namespace_store(namespace)
    }
}

#[async_trait]
impl ResponseStore for PersistentResponseStore {
    async fn open(&self, namespace: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.register(namespace).map(|_| ())
    }

    async fn lookup(&self, namespace: &str, key: &str) -> Result<Option<Response>> {
        if !self.read_names()?.contains(namespace) {
            return Ok(None);
        }
        let handle = self.namespace_store(namespace)?;
        let Some(slot) = self.read_entries(&handle)?.remove(key) else {
            return Ok(None);
        };
        match self.adapter.get(&handle, &slot)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, namespace: &str, key: &str, response: Response) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let handle = self.register(namespace)?;
        let mut entries = self.read_entries(&handle)?;

        let raw = serde_json::to_string(&response)?;
        if let Some(slot) = entries.get(key) {
            return self.adapter.put(&handle, slot, &raw);
        }

        let slot = Uuid::new_v4().simple().to_string();
        self.adapter.put(&handle, &slot, &raw)?;
        entries.insert(key.to_string(), slot);
        let index = serde_json::to_string(&entries)?;
        self.adapter.put(&handle, ENTRY_INDEX_KEY, &index)
    }

    async fn namespaces(&self) -> Result<Vec<String>> {
        Ok(self.read_names()?.into_iter().collect())
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut names = self.read_names()?;
        if !names.remove(namespace) {
            return Ok(false);
        }

        let handle = self.namespace_store(namespace)?;
        for slot in self.read_entries(&handle)?.values() {
            self.adapter.delete(&handle, slot)?;
        }
        self.adapter.delete(&handle, ENTRY_INDEX_KEY)?;
        self.write_names(&names)?;
        Ok(true)
    }
}
