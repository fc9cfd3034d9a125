//! Storage layer
//!
//! Local persistence for the user collection and the avatar side-store.
//!
//! ## Architecture
//!
//! - `users.json`: the full user collection, rewritten as one snapshot after
//!   every mutation (last write wins)
//! - `avatars.json`: data-URI avatars keyed by user id, independent lifecycle
//!
//! Reads degrade to empty on missing or corrupt files; write failures are
//! typed (`StorageError`) but swallowed by the engine as a best-effort
//! policy.

pub mod avatars;
pub mod error;
pub mod users;

pub use avatars::{AvatarMap, AvatarStore};
pub use error::{StorageError, StorageResult};
pub use users::UserStore;
