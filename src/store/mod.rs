//! Object storage for originals and resized variants.
//!
//! The store is a flat namespace of byte blobs keyed by name within a
//! container. The service only needs three operations, captured by
//! [`ImageStore`]:
//!
//! | Operation | Used by |
//! |---|---|
//! | `get` | variant lookup, original fetch |
//! | `put` | persisting a freshly resized variant |
//! | `list` | the `list` CLI command |
//!
//! Objects are never evicted. Two implementations ship with the crate:
//! [`FsStore`] (one directory per container) and [`MemoryStore`].

mod fs;

pub use fs::FsStore;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid object name: {0}")]
    InvalidName(String),
    #[error("Container not found: {0}")]
    ContainerNotFound(String),
}

/// Blob storage keyed by (container, name).
///
/// Calls are blocking. Implementations must tolerate concurrent `put`s to the
/// same name; the last write wins.
pub trait ImageStore: Send + Sync {
    /// Fetch an object. `Ok(None)` when it does not exist.
    fn get(&self, container: &str, name: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Create or overwrite an object.
    fn put(&self, container: &str, name: &str, data: &[u8]) -> Result<(), StoreError>;

    /// Names of all objects in a container, sorted.
    fn list(&self, container: &str) -> Result<Vec<String>, StoreError>;
}

impl<T: ImageStore + ?Sized> ImageStore for Arc<T> {
    fn get(&self, container: &str, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(container, name)
    }

    fn put(&self, container: &str, name: &str, data: &[u8]) -> Result<(), StoreError> {
        (**self).put(container, name, data)
    }

    fn list(&self, container: &str) -> Result<Vec<String>, StoreError> {
        (**self).list(container)
    }
}

/// In-process store. Containers spring into existence on first `put`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    containers: RwLock<HashMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, for seeding originals.
    pub fn with_object(self, container: &str, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.containers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(container.to_string())
            .or_default()
            .insert(name.to_string(), data.into());
        self
    }
}

impl ImageStore for MemoryStore {
    fn get(&self, container: &str, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let containers = self.containers.read().unwrap_or_else(PoisonError::into_inner);
        Ok(containers
            .get(container)
            .and_then(|objects| objects.get(name))
            .cloned())
    }

    fn put(&self, container: &str, name: &str, data: &[u8]) -> Result<(), StoreError> {
        self.containers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(container.to_string())
            .or_default()
            .insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn list(&self, container: &str) -> Result<Vec<String>, StoreError> {
        let containers = self.containers.read().unwrap_or_else(PoisonError::into_inner);
        containers
            .get(container)
            .map(|objects| objects.keys().cloned().collect())
            .ok_or_else(|| StoreError::ContainerNotFound(container.to_string()))
    }
}
