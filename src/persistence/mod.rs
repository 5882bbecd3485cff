//! Persistence Module
//!
//! Durable key/value stores behind a small open/get/put/delete interface.
//! The object cache keeps its snapshot here and the offline queue its log.

mod file;
mod memory;

pub use file::FileAdapter;
pub use memory::MemoryAdapter;

use crate::error::Result;

/// Opaque reference to a named store returned by [`PersistenceAdapter::open`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreHandle {
    name: String,
}

impl StoreHandle {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Durable string store.
///
/// Implementations must create the underlying storage on first `open`.
/// Values are opaque strings; callers serialize with serde_json.
pub trait PersistenceAdapter: Send + Sync {
    fn open(&self, name: &str) -> Result<StoreHandle>;

    fn get(&self, handle: &StoreHandle, key: &str) -> Result<Option<String>>;

    fn put(&self, handle: &StoreHandle, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn delete(&self, handle: &StoreHandle, key: &str) -> Result<()>;
}
