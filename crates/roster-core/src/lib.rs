//! roster core library
//!
//! This crate provides the core functionality for roster, a local-first
//! user directory manager backed by a remote placeholder REST API.
//!
//! # Architecture
//!
//! - **Remote directory**: best-effort REST collaborator (JSONPlaceholder by
//!   default)
//! - **Local snapshot**: the authoritative fallback; the full collection is
//!   persisted after every operation
//! - **Avatar side-store**: data-URI avatars keyed by user id, overriding
//!   anything the remote returns
//!
//! The `SyncEngine` ties these together: reads fall back to the cache, and
//! mutations apply optimistically whether or not the remote accepts them.
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let mut engine = SyncEngine::open(&config)?;
//!
//! let users = engine.fetch_all().await?;
//!
//! let outcome = engine
//!     .create_user(NewUser::new("Ada", "ada", "ada@example.com", "555-0100"))
//!     .await;
//! ```
//!
//! # Modules
//!
//! - `engine`: the synchronization engine (main entry point)
//! - `models`: user record and payload types
//! - `remote`: HTTP client for the remote directory
//! - `storage`: local snapshot and avatar persistence
//! - `config`: application configuration

pub mod config;
pub mod engine;
pub mod models;
pub mod remote;
pub mod storage;

pub use config::Config;
pub use engine::{
    DeleteOutcome, EngineError, EngineStatus, FetchedUser, MutationOutcome, RecordSource,
    SyncEngine,
};
pub use models::{Address, Company, NewUser, User};
pub use remote::{HttpRemote, RemoteDirectory, RemoteError};
pub use storage::{AvatarMap, AvatarStore, StorageError, UserStore};
