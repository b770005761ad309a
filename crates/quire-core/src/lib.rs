//! # quire-core
//!
//! Core types, traits, and abstractions for the quire note-sync engine.
//!
//! This crate provides the domain models, the remote-store gateway traits,
//! the auth-provider contract, and the shared error taxonomy that the other
//! quire crates depend on. It performs no I/O of its own.

pub mod auth;
pub mod defaults;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use auth::{AuthProvider, AuthUser, LocalAuthProvider};
pub use error::{Error, Result};
pub use gateway::{FolderStore, Gateway, NoteStore, PermissionStore, RemoteStore};
pub use models::*;
pub use uuid_utils::{extract_timestamp, is_v7, new_v7};
