//! User snapshot persistence
//!
//! The full user collection is persisted as one JSON document (`users.json`)
//! and rewritten after every mutation. Uses atomic writes (write to temp
//! file, then rename) to prevent corruption.
//!
//! Reads never fail: a missing or corrupt snapshot is treated as empty, per
//! the cache-fallback policy.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::{StorageError, StorageResult};
use crate::models::User;

/// On-disk snapshot shape: the ordered collection plus cache metadata
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    saved_at: DateTime<Utc>,
    users: Vec<User>,
}

/// Persistence for the user collection snapshot
pub struct UserStore {
    path: PathBuf,
}

impl UserStore {
    /// Create a store backed by the given snapshot file
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path to the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if a snapshot exists on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the persisted collection
    ///
    /// Returns an empty collection if the file is absent or unreadable;
    /// corruption is logged and never propagated.
    pub fn read(&self) -> Vec<User> {
        if !self.path.exists() {
            return Vec::new();
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to read user snapshot {:?}: {}", self.path, e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Snapshot>(&content) {
            Ok(snapshot) => snapshot.users,
            Err(e) => {
                warn!("Corrupt user snapshot {:?}: {}", self.path, e);
                Vec::new()
            }
        }
    }

    /// Overwrite the snapshot with the given collection
    pub fn write(&self, users: &[User]) -> StorageResult<()> {
        let snapshot = Snapshot {
            saved_at: Utc::now(),
            users: users.to_vec(),
        };

        let json = serde_json::to_vec_pretty(&snapshot).map_err(|e| {
            StorageError::InvalidFormat {
                path: self.path.clone(),
                details: e.to_string(),
            }
        })?;

        atomic_write(&self.path, &json)
    }

    /// When the snapshot was last written, if one exists and parses
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        let content = fs::read_to_string(&self.path).ok()?;
        let snapshot: Snapshot = serde_json::from_str(&content).ok()?;
        Some(snapshot.saved_at)
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// This ensures the target file is never left in a partially-written state.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    // Sync to disk before rename
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|e| StorageError::AtomicWriteFailed {
        from: temp_path,
        to: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use tempfile::TempDir;

    fn sample_users() -> Vec<User> {
        vec![
            User::from_payload(1, NewUser::new("One", "one", "one@example.com", "111")),
            User::from_payload(2, NewUser::new("Two", "two", "two@example.com", "222")),
        ]
    }

    #[test]
    fn test_read_missing_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = UserStore::new(temp_dir.path().join("users.json"));

        assert!(!store.exists());
        assert!(store.read().is_empty());
    }

    #[test]
    fn test_write_and_read_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = UserStore::new(temp_dir.path().join("users.json"));

        let users = sample_users();
        store.write(&users).unwrap();

        assert!(store.exists());
        assert_eq!(store.read(), users);
        assert!(store.saved_at().is_some());
    }

    #[test]
    fn test_read_corrupt_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.json");
        fs::write(&path, "not json at all {{{").unwrap();

        let store = UserStore::new(path);
        assert!(store.read().is_empty());
    }

    #[test]
    fn test_write_preserves_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = UserStore::new(temp_dir.path().join("users.json"));

        let mut users = sample_users();
        users.reverse();
        store.write(&users).unwrap();

        let read_back = store.read();
        assert_eq!(read_back[0].id, 2);
        assert_eq!(read_back[1].id, 1);
    }

    #[test]
    fn test_overwrite_replaces_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let store = UserStore::new(temp_dir.path().join("users.json"));

        store.write(&sample_users()).unwrap();
        store.write(&sample_users()[..1]).unwrap();

        assert_eq!(store.read().len(), 1);
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("a").join("b").join("users.json");

        let store = UserStore::new(nested_path.clone());
        store.write(&sample_users()).unwrap();

        assert!(nested_path.exists());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.json");

        let store = UserStore::new(path.clone());
        store.write(&sample_users()).unwrap();

        assert!(!path.with_extension("tmp").exists());
    }
}
