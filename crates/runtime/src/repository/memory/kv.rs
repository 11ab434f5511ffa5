//! In-memory KeyValueStore implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::repository::{KeyValueStore, RepositoryError, Result};
use crate::utils::{read, write};

/// In-memory implementation of KeyValueStore.
///
/// [`InMemoryKeyValueStore::unavailable`] builds a store that rejects every
/// operation, standing in for hosts where durable storage is disabled.
pub struct InMemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
    available: bool,
}

impl InMemoryKeyValueStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            available: true,
        }
    }

    /// Create a store whose every operation fails with `StorageUnavailable`.
    pub fn unavailable() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            available: false,
        }
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(RepositoryError::StorageUnavailable(String::from(
                "storage disabled",
            )))
        }
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.ensure_available()?;
        Ok(read(&self.values).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_available()?;
        write(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.ensure_available()?;
        write(&self.values).remove(key);
        Ok(())
    }
}
