//! Error types for the quire note-sync engine.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using quire's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Fixed guard message for operations on the protected Default folder.
pub const DEFAULT_FOLDER_GUARD_MSG: &str = "The Default folder cannot be renamed or deleted";

/// Core error type for quire operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Remote store operation failed (non-database backends)
    #[error("Store error: {0}")]
    Store(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Folder not found
    #[error("Folder not found: {0}")]
    FolderNotFound(Uuid),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(Uuid),

    /// Invalid input, rejected before any remote call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Attempted rename/delete of the protected Default folder
    #[error("{}", DEFAULT_FOLDER_GUARD_MSG)]
    DefaultFolderProtected,

    /// Acting user lacks edit rights on the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors resolved synchronously, before any remote call
    /// (validation failures and the Default-folder guard).
    pub fn is_local_rejection(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::DefaultFolderProtected | Error::Forbidden(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
