//! Repository contracts for durable key-value records.

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::{RepositoryError, Result};
use super::types::StorageKey;

/// Durable string key-value store.
///
/// Keys are short ASCII identifiers; values are opaque strings (JSON in
/// practice). Implementations must be safe to share across tasks.
pub trait KeyValueStore: Send + Sync {
    /// Load the value under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Check if `key` currently holds a value.
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Typed JSON records on top of any [`KeyValueStore`].
pub trait RecordStore {
    /// Load and decode a record.
    ///
    /// A value that fails to decode is treated as absent and logged.
    fn load_record<T: DeserializeOwned>(&self, key: StorageKey) -> Result<Option<T>>;

    /// Encode and store a record.
    fn save_record<T: Serialize>(&self, key: StorageKey, record: &T) -> Result<()>;

    /// Remove a record.
    fn remove_record(&self, key: StorageKey) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> RecordStore for S {
    fn load_record<T: DeserializeOwned>(&self, key: StorageKey) -> Result<Option<T>> {
        let Some(raw) = self.get(key.as_ref())? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!("Ignoring malformed record under {}: {}", key, e);
                Ok(None)
            }
        }
    }

    fn save_record<T: Serialize>(&self, key: StorageKey, record: &T) -> Result<()> {
        let json = serde_json::to_string(record).map_err(|e| RepositoryError::Json(e.to_string()))?;
        self.set(key.as_ref(), &json)
    }

    fn remove_record(&self, key: StorageKey) -> Result<()> {
        self.remove(key.as_ref())
    }
}
