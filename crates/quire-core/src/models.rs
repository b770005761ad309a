//! Core data models for the quire note-sync engine.
//!
//! These types are shared across all quire crates and represent the
//! domain entities held in the remote store and published to subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// FOLDER TYPES
// =============================================================================

/// A user-owned grouping of notes.
///
/// Exactly one folder per owner carries the distinguished Default name
/// (see [`crate::defaults::DEFAULT_FOLDER_NAME`]); it is created lazily on
/// first use and is never renamed or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

// =============================================================================
// NOTE TYPES
// =============================================================================

/// A note. Always belongs to exactly one folder via `folder_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub folder_id: Uuid,
    pub title: String,
    pub content: String,
    pub owner_id: Uuid,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

/// Request for inserting a new note into the store.
#[derive(Debug, Clone)]
pub struct CreateNoteRequest {
    pub folder_id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
}

/// Fields mutable after note creation. Folder and owner are immutable
/// post-creation; `updated_at_utc` is stamped by the store.
#[derive(Debug, Clone, Default)]
pub struct NoteUpdate {
    pub title: String,
    pub content: String,
}

/// Add-or-update input consumed by the synchronization core.
///
/// A draft without an id is a creation; a draft with an id updates the
/// title and content of the existing note.
#[derive(Debug, Clone)]
pub struct NoteDraft {
    pub id: Option<Uuid>,
    pub folder_id: Uuid,
    pub title: String,
    pub content: String,
}

impl NoteDraft {
    /// Draft for a brand-new note in the given folder.
    pub fn new(folder_id: Uuid, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            folder_id,
            title: title.into(),
            content: content.into(),
        }
    }

    /// Draft editing an existing note.
    pub fn editing(note: &Note) -> Self {
        Self {
            id: Some(note.id),
            folder_id: note.folder_id,
            title: note.title.clone(),
            content: note.content.clone(),
        }
    }
}

// =============================================================================
// PERMISSION TYPES
// =============================================================================

/// Access rights on a folder or note, keyed by (resource, user) in the store.
///
/// A record granting the creator full access is written alongside every
/// folder and note at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Permission {
    pub can_edit: bool,
    pub can_view: bool,
}

impl Permission {
    /// Full access, granted to the creator of a resource.
    pub fn full() -> Self {
        Self {
            can_edit: true,
            can_view: true,
        }
    }

    /// Read-only access.
    pub fn read_only() -> Self {
        Self {
            can_edit: false,
            can_view: true,
        }
    }
}
