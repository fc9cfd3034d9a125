//! Synchronization engine
//!
//! The `SyncEngine` owns the authoritative in-memory user collection and
//! coordinates between:
//! - the remote directory (best-effort)
//! - the local snapshot and avatar stores (authoritative fallback)
//!
//! ## Policies
//!
//! - Reads fall back to the persisted snapshot when the remote is
//!   unavailable; an error surfaces only when the cache is empty too.
//! - Mutations are optimistic: remote failure never fails the operation,
//!   it only clears the `remote_synced` flag on the outcome and records
//!   `last_error` for diagnostics.
//! - Every completed operation persists the full collection as one snapshot
//!   overwrite. Overlapping operations therefore resolve as last write wins;
//!   callers issuing concurrent mutations accept that ordering.
//! - Avatars are resolved from the side-store after every read or mutation,
//!   overriding whatever the remote carries.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{NewUser, User};
use crate::remote::{HttpRemote, RemoteDirectory, RemoteError};
use crate::storage::{AvatarStore, UserStore};

/// Errors surfaced by engine operations
///
/// Mutations absorb remote failures, so only the read paths and up-front
/// validation produce these.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Remote unreachable and no cached data to serve instead
    #[error("Remote directory unavailable and no cached users: {0}")]
    RemoteUnavailable(#[source] RemoteError),

    /// Record absent from both the cache and the remote
    #[error("User {id} not found")]
    NotFound { id: u64 },

    /// Id rejected before any attempt was made
    #[error("Invalid user id: {id}")]
    InvalidId { id: u64 },
}

/// Where a fetched record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    /// Served by the remote directory
    Remote,
    /// Served from the local snapshot without a remote call
    Cache,
}

/// Result of `fetch_one`
#[derive(Debug, Clone)]
pub struct FetchedUser {
    pub user: User,
    pub source: RecordSource,
}

/// Best-effort result of create and update
///
/// `remote_synced` is false when the remote rejected the mutation and the
/// change was applied locally only.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub user: User,
    pub remote_synced: bool,
}

/// Best-effort result of delete
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub id: u64,
    pub remote_synced: bool,
}

/// Observable engine state for embedding UIs
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub loading: bool,
    pub creating: bool,
    pub updating: bool,
    pub deleting_ids: Vec<u64>,
    pub last_error: Option<String>,
}

/// The client-side synchronization engine for the user collection
pub struct SyncEngine {
    /// Remote directory collaborator
    remote: Box<dyn RemoteDirectory>,
    /// Persisted snapshot of the collection
    users: UserStore,
    /// Persisted avatar side-store
    avatars: AvatarStore,
    /// Authoritative in-memory collection
    list: Vec<User>,
    loading: bool,
    creating: bool,
    updating: bool,
    /// Ids with a delete in flight (drives per-row busy indicators)
    deleting_ids: HashSet<u64>,
    /// Most recent remote or validation error, for diagnostics
    last_error: Option<String>,
}

impl SyncEngine {
    /// Build an engine talking HTTP to the configured remote
    pub fn open(config: &Config) -> Result<Self, RemoteError> {
        let remote = HttpRemote::new(config)?;
        Ok(Self::with_remote(
            Box::new(remote),
            UserStore::new(config.users_path()),
            AvatarStore::new(config.avatars_path()),
        ))
    }

    /// Build an engine from explicit collaborators (tests, embedding)
    pub fn with_remote(
        remote: Box<dyn RemoteDirectory>,
        users: UserStore,
        avatars: AvatarStore,
    ) -> Self {
        Self {
            remote,
            users,
            avatars,
            list: Vec::new(),
            loading: false,
            creating: false,
            updating: false,
            deleting_ids: HashSet::new(),
            last_error: None,
        }
    }

    // ==================== Observable state ====================

    /// The in-memory collection
    pub fn list(&self) -> &[User] {
        &self.list
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_creating(&self) -> bool {
        self.creating
    }

    pub fn is_updating(&self) -> bool {
        self.updating
    }

    /// Ids currently mid-deletion
    pub fn deleting_ids(&self) -> &HashSet<u64> {
        &self.deleting_ids
    }

    /// Most recent error message, if any
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Snapshot of the observable state
    pub fn status(&self) -> EngineStatus {
        let mut deleting_ids: Vec<u64> = self.deleting_ids.iter().copied().collect();
        deleting_ids.sort_unstable();
        EngineStatus {
            loading: self.loading,
            creating: self.creating,
            updating: self.updating,
            deleting_ids,
            last_error: self.last_error.clone(),
        }
    }

    // ==================== Operations ====================

    /// Fetch the full collection, merging remote state over the local cache
    ///
    /// Local users win on id conflicts and keep their stored order; remote
    /// users the cache doesn't know about are appended in returned order.
    /// On remote failure the persisted snapshot is served instead; an error
    /// surfaces only when that is empty too.
    pub async fn fetch_all(&mut self) -> Result<&[User], EngineError> {
        self.loading = true;
        self.last_error = None;

        let local = self.users.read();

        let merged = match self.remote.list().await {
            Ok(remote_users) => {
                debug!(
                    "Merging {} local and {} remote users",
                    local.len(),
                    remote_users.len()
                );
                merge_local_first(local, remote_users)
            }
            Err(e) => {
                if local.is_empty() {
                    warn!("Remote list failed with empty cache: {}", e);
                    self.loading = false;
                    self.last_error = Some(e.to_string());
                    return Err(EngineError::RemoteUnavailable(e));
                }
                // Silent degradation: the cache serves the read
                info!("Remote list failed, serving {} cached users: {}", local.len(), e);
                local
            }
        };

        let resolved = self.resolve_avatars(merged);
        self.persist(&resolved);
        self.list = resolved;
        self.loading = false;
        Ok(&self.list)
    }

    /// Fetch a single record, serving the cache without a remote call on a hit
    pub async fn fetch_one(&mut self, id: u64) -> Result<FetchedUser, EngineError> {
        if id == 0 {
            return Err(EngineError::InvalidId { id });
        }

        self.loading = true;
        self.last_error = None;

        let cached = self.users.read().into_iter().find(|u| u.id == id);

        let (user, source) = match cached {
            Some(user) => (user, RecordSource::Cache),
            None => match self.remote.get(id).await {
                Ok(user) => (user, RecordSource::Remote),
                Err(e) => {
                    self.loading = false;
                    self.last_error = Some(e.to_string());
                    return Err(match e {
                        RemoteError::NotFound { id } => EngineError::NotFound { id },
                        other => EngineError::RemoteUnavailable(other),
                    });
                }
            },
        };

        let user = self.resolve_one(user);
        self.upsert_snapshot(&user);
        upsert(&mut self.list, user.clone());
        self.loading = false;

        Ok(FetchedUser { user, source })
    }

    /// Create a record, optimistically when the remote rejects it
    ///
    /// The final id is the server-assigned one unless it is missing or
    /// collides with the in-memory collection, in which case a fresh
    /// monotonic id (max + 1) is minted. The new record goes to the head of
    /// the collection (most recent first).
    pub async fn create_user(&mut self, payload: NewUser) -> MutationOutcome {
        self.creating = true;
        self.last_error = None;

        let (server_id, remote_synced) = match self.remote.create(&payload).await {
            Ok(created) => (created.id, true),
            Err(e) => {
                warn!("Remote create failed, applying locally: {}", e);
                self.last_error = Some(e.to_string());
                (None, false)
            }
        };

        let id = match server_id {
            Some(id) if !self.contains(id) => id,
            _ => self.next_id(),
        };

        if let Some(uri) = payload.avatar_url.clone() {
            self.store_avatar(id, uri);
        }

        let user = self.resolve_one(User::from_payload(id, payload));
        self.list.insert(0, user.clone());
        self.persist_list();
        self.creating = false;

        info!("Created user {} (remote_synced={})", id, remote_synced);
        MutationOutcome { user, remote_synced }
    }

    /// Replace a record, optimistically when the remote rejects it
    ///
    /// Full replacement semantics; no partial patch. Replaces in place if the
    /// id is present, appends otherwise.
    pub async fn update_user(&mut self, id: u64, payload: NewUser) -> MutationOutcome {
        self.updating = true;
        self.last_error = None;

        let remote_synced = match self.remote.update(id, &payload).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Remote update for {} failed, applying locally: {}", id, e);
                self.last_error = Some(e.to_string());
                false
            }
        };

        if let Some(uri) = payload.avatar_url.clone() {
            self.store_avatar(id, uri);
        }

        let user = self.resolve_one(User::from_payload(id, payload));
        upsert(&mut self.list, user.clone());
        self.persist_list();
        self.updating = false;

        MutationOutcome { user, remote_synced }
    }

    /// Delete a record; the remote outcome is swallowed (simulated success)
    ///
    /// Removes the record and its avatar entry regardless of the remote
    /// result. The only error path is up-front id validation.
    pub async fn delete_user(&mut self, id: u64) -> Result<DeleteOutcome, EngineError> {
        if id == 0 {
            return Err(EngineError::InvalidId { id });
        }

        self.deleting_ids.insert(id);
        self.last_error = None;

        let remote_synced = match self.remote.delete(id).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Remote delete for {} failed, removing locally anyway: {}", id, e);
                self.last_error = Some(e.to_string());
                false
            }
        };

        self.list.retain(|u| u.id != id);
        if let Err(e) = self.avatars.remove(id) {
            warn!("Failed to remove avatar for {}: {}", id, e);
        }
        self.persist_list();
        self.deleting_ids.remove(&id);

        info!("Deleted user {} (remote_synced={})", id, remote_synced);
        Ok(DeleteOutcome { id, remote_synced })
    }

    /// Set or clear a user's avatar without touching the rest of the record
    ///
    /// Updates the side-store and re-resolves the record in the in-memory
    /// collection and the persisted snapshot. Storage failures are
    /// swallowed like every other persistence path.
    pub fn set_avatar(&mut self, id: u64, data_uri: Option<String>) {
        if let Err(e) = self.avatars.set(id, data_uri.clone()) {
            warn!("Failed to update avatar for {}: {}", id, e);
        }

        if let Some(user) = self.list.iter_mut().find(|u| u.id == id) {
            user.avatar_url = data_uri.clone();
        }

        let mut stored = self.users.read();
        match stored.iter_mut().find(|u| u.id == id) {
            Some(user) => user.avatar_url = data_uri,
            // Record known only in memory: bring the snapshot back in step
            None => {
                if let Some(user) = self.list.iter().find(|u| u.id == id) {
                    stored.push(user.clone());
                }
            }
        }
        self.persist(&stored);
    }

    // ==================== Internals ====================

    fn contains(&self, id: u64) -> bool {
        self.list.iter().any(|u| u.id == id)
    }

    /// Next locally-unique id: max of the in-memory collection, plus one
    fn next_id(&self) -> u64 {
        self.list.iter().map(|u| u.id).max().unwrap_or(0) + 1
    }

    /// Overwrite avatars from the side-store where entries exist
    fn resolve_avatars(&self, users: Vec<User>) -> Vec<User> {
        let map = self.avatars.read();
        users
            .into_iter()
            .map(|mut user| {
                if let Some(uri) = map.get(&user.id) {
                    user.avatar_url = Some(uri.clone());
                }
                user
            })
            .collect()
    }

    fn resolve_one(&self, mut user: User) -> User {
        if let Some(uri) = self.avatars.read().get(&user.id) {
            user.avatar_url = Some(uri.clone());
        }
        user
    }

    fn store_avatar(&mut self, id: u64, uri: String) {
        if let Err(e) = self.avatars.set(id, Some(uri)) {
            warn!("Failed to store avatar for {}: {}", id, e);
        }
    }

    /// Persist a snapshot, swallowing storage failures
    fn persist(&self, users: &[User]) {
        if let Err(e) = self.users.write(users) {
            warn!("Failed to persist user snapshot: {}", e);
        }
    }

    /// Persist the in-memory collection
    fn persist_list(&self) {
        self.persist(&self.list);
    }

    /// Upsert one record into the persisted snapshot without touching the
    /// rest of the stored collection
    fn upsert_snapshot(&self, user: &User) {
        let mut stored = self.users.read();
        upsert(&mut stored, user.clone());
        self.persist(&stored);
    }
}

/// Merge policy for `fetch_all`: local users first in stored order (they may
/// carry optimistic records the server doesn't know about), then remote
/// users whose id is not already present, in returned order.
fn merge_local_first(local: Vec<User>, remote: Vec<User>) -> Vec<User> {
    let known: HashSet<u64> = local.iter().map(|u| u.id).collect();
    let mut merged = local;
    merged.extend(remote.into_iter().filter(|u| !known.contains(&u.id)));
    merged
}

/// Replace a record in place if its id is present, append otherwise
fn upsert(list: &mut Vec<User>, user: User) {
    match list.iter().position(|u| u.id == user.id) {
        Some(index) => list[index] = user,
        None => list.push(user),
    }
}
