//! JSON-file adapter: one directory per store, one file per key.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{PersistenceAdapter, StoreHandle};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct FileAdapter {
    root: PathBuf,
}

impl FileAdapter {
    /// Creates the root directory if it does not exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, handle: &StoreHandle) -> PathBuf {
        self.root.join(sanitize(handle.name()))
    }

    fn entry_path(&self, handle: &StoreHandle, key: &str) -> PathBuf {
        self.store_dir(handle).join(format!("{}.json", sanitize(key)))
    }
}

/// Maps a key onto a portable file name.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl PersistenceAdapter for FileAdapter {
    fn open(&self, name: &str) -> Result<StoreHandle> {
        let handle = StoreHandle::new(name);
        fs::create_dir_all(self.store_dir(&handle))?;
        debug!("Opened file store {}", name);
        Ok(handle)
    }

    fn get(&self, handle: &StoreHandle, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.entry_path(handle, key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn put(&self, handle: &StoreHandle, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(handle, key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn delete(&self, handle: &StoreHandle, key: &str) -> Result<()> {
        match fs::remove_file(self.entry_path(handle, key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
