//! In-process adapter, used as the default store and in tests.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{PersistenceAdapter, StoreHandle};
use crate::error::{CacheError, Result};

/// Keeps every named store in a map; contents live as long as the adapter.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    stores: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn unopened(handle: &StoreHandle) -> CacheError {
        CacheError::Persistence(format!("Store not opened: {}", handle.name()))
    }
}

impl PersistenceAdapter for MemoryAdapter {
    fn open(&self, name: &str) -> Result<StoreHandle> {
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        stores.entry(name.to_string()).or_default();
        Ok(StoreHandle::new(name))
    }

    fn get(&self, handle: &StoreHandle, key: &str) -> Result<Option<String>> {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        let store = stores
            .get(handle.name())
            .ok_or_else(|| Self::unopened(handle))?;
        Ok(store.get(key).cloned())
    }

    fn put(&self, handle: &StoreHandle, key: &str, value: &str) -> Result<()> {
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        let store = stores
            .get_mut(handle.name())
            .ok_or_else(|| Self::unopened(handle))?;
        store.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, handle: &StoreHandle, key: &str) -> Result<()> {
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        let store = stores
            .get_mut(handle.name())
            .ok_or_else(|| Self::unopened(handle))?;
        store.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete() {
        let adapter = MemoryAdapter::new();
        let handle = adapter.open("object-cache").unwrap();

        assert_eq!(adapter.get(&handle, "snapshot").unwrap(), None);

        adapter.put(&handle, "snapshot", "{}").unwrap();
        assert_eq!(adapter.get(&handle, "snapshot").unwrap().as_deref(), Some("{}"));

        adapter.delete(&handle, "snapshot").unwrap();
        adapter.delete(&handle, "snapshot").unwrap();
        assert_eq!(adapter.get(&handle, "snapshot").unwrap(), None);
    }

    #[test]
    fn test_reopen_keeps_contents() {
        let adapter = MemoryAdapter::new();
        let handle = adapter.open("queue").unwrap();
        adapter.put(&handle, "k", "v").unwrap();

        let again = adapter.open("queue").unwrap();
        assert_eq!(again, handle);
        assert_eq!(adapter.get(&again, "k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_stores_are_isolated() {
        let adapter = MemoryAdapter::new();
        let a = adapter.open("a").unwrap();
        let b = adapter.open("b").unwrap();

        adapter.put(&a, "k", "from-a").unwrap();
        assert_eq!(adapter.get(&b, "k").unwrap(), None);
    }

    #[test]
    fn test_unopened_store_errors() {
        let adapter = MemoryAdapter::new();
        let handle = StoreHandle::new("never-opened");
        assert!(matches!(
            adapter.get(&handle, "k"),
            Err(CacheError::Persistence(_))
        ));
    }
}
