//! Remote-store gateway traits.
//!
//! These traits define the contract the synchronization core requires of the
//! remote document store, enabling pluggable backends and testability. All
//! operations are asynchronous and individually fallible; the core never
//! assumes ordering between independent calls beyond what it sequences
//! itself.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CreateNoteRequest, Folder, Note, NoteUpdate, Permission};

// =============================================================================
// FOLDER STORE
// =============================================================================

/// Store operations on folders.
#[async_trait]
pub trait FolderStore: Send + Sync {
    /// Create a folder owned by `owner`. The store assigns the id.
    async fn create(&self, owner: Uuid, name: &str) -> Result<Uuid>;

    /// Get a folder by id.
    async fn get(&self, id: Uuid) -> Result<Option<Folder>>;

    /// Find one folder owned by `owner` with the exact given name
    /// (limit-1 query; which folder is returned when duplicates exist is
    /// unspecified).
    async fn find_by_name(&self, owner: Uuid, name: &str) -> Result<Option<Folder>>;

    /// List all folders owned by `owner`.
    async fn list(&self, owner: Uuid) -> Result<Vec<Folder>>;

    /// Rename a folder. Stamps `updated_at_utc`.
    async fn rename(&self, id: Uuid, new_name: &str) -> Result<()>;

    /// Delete a folder record. Does NOT cascade to notes; callers must
    /// delete contained notes first (see the two-phase rule in the sync
    /// core).
    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// NOTE STORE
// =============================================================================

/// Store operations on notes.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Insert a new note. The store assigns the id.
    async fn insert(&self, req: CreateNoteRequest) -> Result<Uuid>;

    /// Fetch a single note by id.
    async fn fetch(&self, id: Uuid) -> Result<Option<Note>>;

    /// List notes where owner and folder both match.
    async fn list_for_folder(&self, owner: Uuid, folder_id: Uuid) -> Result<Vec<Note>>;

    /// List every note owned by `owner`, across folders.
    async fn list_all(&self, owner: Uuid) -> Result<Vec<Note>>;

    /// Update title and content of an existing note. Stamps
    /// `updated_at_utc`; folder and owner are immutable.
    async fn update(&self, id: Uuid, update: NoteUpdate) -> Result<()>;

    /// Delete a single note by id.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Batch-delete all notes of `owner` within a folder.
    async fn delete_in_folder(&self, owner: Uuid, folder_id: Uuid) -> Result<()>;

    /// Batch-delete every note owned by `owner`.
    async fn delete_all_for_owner(&self, owner: Uuid) -> Result<()>;
}

// =============================================================================
// PERMISSION STORE
// =============================================================================

/// Store operations on permission records.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Set the permission record for (resource, user), replacing any
    /// existing one.
    async fn set(&self, resource_id: Uuid, user_id: Uuid, permission: Permission) -> Result<()>;

    /// Get the permission record for (resource, user), if any.
    async fn get(&self, resource_id: Uuid, user_id: Uuid) -> Result<Option<Permission>>;
}

// =============================================================================
// COMBINED GATEWAY
// =============================================================================

/// Marker for backends implementing the full gateway contract.
pub trait RemoteStore: FolderStore + NoteStore + PermissionStore {}

impl<T: FolderStore + NoteStore + PermissionStore> RemoteStore for T {}

/// The remote-store gateway the synchronization core consumes: one handle
/// per entity repository, so backends may be a single object or three.
#[derive(Clone)]
pub struct Gateway {
    pub folders: std::sync::Arc<dyn FolderStore>,
    pub notes: std::sync::Arc<dyn NoteStore>,
    pub permissions: std::sync::Arc<dyn PermissionStore>,
}

impl Gateway {
    /// Assemble a gateway from separate repositories.
    pub fn new(
        folders: std::sync::Arc<dyn FolderStore>,
        notes: std::sync::Arc<dyn NoteStore>,
        permissions: std::sync::Arc<dyn PermissionStore>,
    ) -> Self {
        Self {
            folders,
            notes,
            permissions,
        }
    }

    /// Build a gateway from one backend implementing the full contract.
    pub fn from_store<S: RemoteStore + 'static>(store: std::sync::Arc<S>) -> Self {
        Self {
            folders: store.clone(),
            notes: store.clone(),
            permissions: store,
        }
    }
}
