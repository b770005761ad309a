//! # quire-sync
//!
//! The folder-scoped note synchronization core.
//!
//! This crate provides:
//! - Observable published state with last-known snapshots
//!   ([`Published`](state::Published), [`SessionState`](state::SessionState))
//! - The session state machine mediating all folder/note mutations through
//!   the remote-store gateway ([`SyncSession`](session::SyncSession))
//! - A supervisor binding sessions to auth transitions
//!   ([`SyncCore`](crate::core::SyncCore))
//! - Stale-fetch fencing by generation counter, so only the most recently
//!   requested folder's notes are ever published
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use quire_core::{AuthUser, LocalAuthProvider};
//! use quire_store::MemoryStore;
//! use quire_sync::{SyncConfig, SyncCore};
//!
//! let auth = Arc::new(LocalAuthProvider::new());
//! let store = MemoryStore::new();
//! let core = SyncCore::start(auth.clone(), store.gateway(), SyncConfig::default());
//!
//! auth.sign_in(AuthUser::new(quire_core::new_v7(), "Alice"));
//!
//! // ... the supervisor builds a session, bootstraps the Default folder,
//! // and publishes it:
//! let mut sessions = core.watch_session();
//! sessions.changed().await?;
//! let session = core.session().expect("session after sign-in");
//! session.add_folder("Work").await?;
//! ```

pub mod config;
pub mod core;
pub mod session;
pub mod state;

// Re-export core types
pub use quire_core::*;

pub use crate::config::SyncConfig;
pub use crate::core::SyncCore;
pub use crate::session::SyncSession;
pub use crate::state::{MessageKind, Published, SessionState, StatusMessage};
