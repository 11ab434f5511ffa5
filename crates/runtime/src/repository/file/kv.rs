//! File-based KeyValueStore implementation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::repository::{KeyValueStore, RepositoryError, Result};

/// File-based implementation of KeyValueStore.
///
/// Each key is stored as `{key}.json` inside `base_dir`. Writes go to a
/// temporary file first and are renamed into place, so a crash never leaves a
/// half-written record behind.
pub struct FileKeyValueStore {
    base_dir: PathBuf,
}

impl FileKeyValueStore {
    /// Create a new file-based store, creating `base_dir` if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(RepositoryError::Io)?;
        Ok(Self { base_dir })
    }

    /// Store under the platform data directory (`~/.local/share/eldritch-sanctuary` on Linux).
    pub fn in_default_dir() -> Result<Self> {
        Self::new(Self::default_dir()?)
    }

    pub fn default_dir() -> Result<PathBuf> {
        directories::ProjectDirs::from("", "", "eldritch-sanctuary")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                RepositoryError::StorageUnavailable(String::from("no home directory"))
            })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn record_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(RepositoryError::InvalidKey(key.to_string()));
        }
        Ok(self.base_dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.record_path(key)?;

        if !path.exists() {
            return Ok(None);
        }

        let value = fs::read_to_string(&path).map_err(RepositoryError::Io)?;
        tracing::trace!("Loaded {} from {}", key, path.display());

        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.record_path(key)?;
        let temp_path = path.with_extension("json.tmp");

        fs::write(&temp_path, value).map_err(RepositoryError::Io)?;
        fs::rename(&temp_path, &path).map_err(RepositoryError::Io)?;

        tracing::debug!("Saved {} to {}", key, path.display());

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.record_path(key)?;

        if path.exists() {
            fs::remove_file(&path).map_err(RepositoryError::Io)?;
            tracing::debug!("Removed {}", key);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_remove() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path()).unwrap();

        assert_eq!(store.get("player_id").unwrap(), None);

        store.set("player_id", "\"abc\"").unwrap();
        assert_eq!(store.get("player_id").unwrap().as_deref(), Some("\"abc\""));
        assert!(dir.path().join("player_id.json").exists());
        assert!(!dir.path().join("player_id.json.tmp").exists());

        store.remove("player_id").unwrap();
        assert_eq!(store.get("player_id").unwrap(), None);
        store.remove("player_id").unwrap();
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        FileKeyValueStore::new(dir.path())
            .unwrap()
            .set("player_choice", "{}")
            .unwrap();

        let reopened = FileKeyValueStore::new(dir.path()).unwrap();
        assert!(reopened.contains("player_choice").unwrap());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path()).unwrap();

        assert!(matches!(
            store.set("../escape", "x"),
            Err(RepositoryError::InvalidKey(_))
        ));
        assert!(matches!(store.get(""), Err(RepositoryError::InvalidKey(_))));
    }
}
