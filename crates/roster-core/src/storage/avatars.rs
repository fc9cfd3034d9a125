//! Avatar map persistence
//!
//! Avatars live outside the user records, keyed by user id, so a re-fetch
//! from the remote never clobbers a locally uploaded image. Stored as one
//! JSON object (`avatars.json`) mapping id to data-URI string.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::error::{StorageError, StorageResult};
use super::users::atomic_write;

/// Mapping from user id to avatar data URI
pub type AvatarMap = BTreeMap<u64, String>;

/// Persistence for the avatar side-store
pub struct AvatarStore {
    path: PathBuf,
}

impl AvatarStore {
    /// Create a store backed by the given file
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path to the avatar map file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted map
    ///
    /// Returns an empty map if the file is absent or unreadable.
    pub fn read(&self) -> AvatarMap {
        if !self.path.exists() {
            return AvatarMap::new();
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to read avatar map {:?}: {}", self.path, e);
                return AvatarMap::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(map) => map,
            Err(e) => {
                warn!("Corrupt avatar map {:?}: {}", self.path, e);
                AvatarMap::new()
            }
        }
    }

    /// Overwrite the persisted map
    pub fn write(&self, map: &AvatarMap) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(map).map_err(|e| StorageError::InvalidFormat {
            path: self.path.clone(),
            details: e.to_string(),
        })?;

        atomic_write(&self.path, &json)
    }

    /// Set or clear the avatar for an id, returning the updated map
    pub fn set(&self, id: u64, data_uri: Option<String>) -> StorageResult<AvatarMap> {
        let mut map = self.read();
        match data_uri {
            Some(uri) => {
                map.insert(id, uri);
            }
            None => {
                map.remove(&id);
            }
        }
        self.write(&map)?;
        Ok(map)
    }

    /// Remove the avatar for an id, returning the updated map
    pub fn remove(&self, id: u64) -> StorageResult<AvatarMap> {
        self.set(id, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_missing_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = AvatarStore::new(temp_dir.path().join("avatars.json"));

        assert!(store.read().is_empty());
    }

    #[test]
    fn test_set_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let store = AvatarStore::new(temp_dir.path().join("avatars.json"));

        store
            .set(3, Some("data:image/png;base64,AAAA".to_string()))
            .unwrap();

        let map = store.read();
        assert_eq!(map.get(&3).unwrap(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_set_none_clears_entry() {
        let temp_dir = TempDir::new().unwrap();
        let store = AvatarStore::new(temp_dir.path().join("avatars.json"));

        store.set(3, Some("data:image/png;base64,AAAA".to_string())).unwrap();
        let map = store.set(3, None).unwrap();

        assert!(map.is_empty());
        assert!(store.read().is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = AvatarStore::new(temp_dir.path().join("avatars.json"));

        let map = store.remove(42).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_read_corrupt_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("avatars.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let store = AvatarStore::new(path);
        assert!(store.read().is_empty());
    }

    #[test]
    fn test_entries_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("avatars.json");

        {
            let store = AvatarStore::new(path.clone());
            store.set(1, Some("data:image/png;base64,AA".to_string())).unwrap();
            store.set(2, Some("data:image/png;base64,BB".to_string())).unwrap();
        }

        let store = AvatarStore::new(path);
        assert_eq!(store.read().len(), 2);
    }
}
