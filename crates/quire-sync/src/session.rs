//! The session state machine.
//!
//! A [`SyncSession`] owns all published state for one signed-in user and
//! mediates every folder/note mutation through the remote-store gateway.
//! Mutations are awaited by the caller; notes fetches are spawned as
//! independent tasks and fenced by a generation counter so that only the
//! most recently requested scope's results are ever published. Superseded
//! results are dropped silently.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use quire_core::defaults::{DEFAULT_FOLDER_NAME, NAME_MAX_LEN};
use quire_core::{
    CreateNoteRequest, Error, Folder, Gateway, Note, NoteDraft, NoteUpdate, Permission, Result,
};

use crate::config::SyncConfig;
use crate::state::{SessionState, StatusMessage};

/// What a spawned notes fetch is scoped to.
#[derive(Debug, Clone, Copy)]
enum NotesScope {
    Folder(Uuid),
    AllNotes,
}

struct SessionInner {
    gateway: Gateway,
    user_id: Uuid,
    state: SessionState,
    /// Incremented on every notes-scope change; each fetch captures its
    /// value at spawn and publishes only while still current.
    fetch_gen: AtomicU64,
}

/// Session-scoped synchronization core for one signed-in user.
///
/// Cheap to clone; all clones share the same published state. Constructed
/// on login and dropped on logout (see [`SyncCore`](crate::SyncCore)).
#[derive(Clone)]
pub struct SyncSession {
    inner: Arc<SessionInner>,
}

impl SyncSession {
    /// Create a session for `user_id` over the given gateway. Callers are
    /// expected to run [`bootstrap`](SyncSession::bootstrap) next.
    pub fn new(gateway: Gateway, user_id: Uuid, config: &SyncConfig) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                gateway,
                user_id,
                state: SessionState::new(config.message_capacity),
                fetch_gen: AtomicU64::new(0),
            }),
        }
    }

    /// The user this session is scoped to.
    pub fn user_id(&self) -> Uuid {
        self.inner.user_id
    }

    /// True if both handles refer to the same underlying session.
    pub fn same_session(&self, other: &SyncSession) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The session's published state.
    pub fn state(&self) -> &SessionState {
        &self.inner.state
    }

    /// Resolve the Default folder and load the folder list. Run once after
    /// construction; failures leave the session usable but empty.
    pub async fn bootstrap(&self) -> Result<()> {
        let start = Instant::now();
        self.ensure_default_folder().await?;
        self.refresh_folders().await?;
        info!(
            subsystem = "sync",
            component = "session",
            op = "bootstrap",
            user_id = %self.inner.user_id,
            duration_ms = start.elapsed().as_millis() as u64,
            "Session bootstrapped"
        );
        Ok(())
    }

    // =========================================================================
    // DEFAULT FOLDER
    // =========================================================================

    /// Resolve the user's Default folder, creating it if absent, and select
    /// it when nothing else is selected.
    ///
    /// The existence check and the creation are not transactional against
    /// the remote store: two concurrent calls can create two Default
    /// folders. The limit-1 lookup then keeps adopting the same (oldest)
    /// one, so repeated calls converge on a single id.
    pub async fn ensure_default_folder(&self) -> Result<Folder> {
        let inner = &self.inner;
        let existing = inner
            .gateway
            .folders
            .find_by_name(inner.user_id, DEFAULT_FOLDER_NAME)
            .await?;

        let folder = match existing {
            Some(folder) => folder,
            None => {
                let id = inner
                    .gateway
                    .folders
                    .create(inner.user_id, DEFAULT_FOLDER_NAME)
                    .await?;
                self.grant_creator_permission(id);
                inner
                    .gateway
                    .folders
                    .get(id)
                    .await?
                    .ok_or(Error::FolderNotFound(id))?
            }
        };

        debug!(
            subsystem = "sync",
            component = "session",
            op = "ensure_default",
            user_id = %inner.user_id,
            folder_id = %folder.id,
            "Default folder resolved"
        );

        inner.state.default_folder.set(Some(folder.clone()));
        if inner.state.selected_folder.get().is_none() {
            self.select_folder(folder.clone());
        }
        Ok(folder)
    }

    // =========================================================================
    // SELECTION & FETCHING
    // =========================================================================

    /// Select a folder and fetch its notes. Supersedes any in-flight notes
    /// fetch: if the previous fetch completes after this one started, its
    /// result is dropped.
    pub fn select_folder(&self, folder: Folder) -> JoinHandle<()> {
        let folder_id = folder.id;
        self.inner.state.selected_folder.set(Some(folder));
        self.spawn_fetch(NotesScope::Folder(folder_id))
    }

    /// Select (or clear) the note open for editing.
    pub fn select_note(&self, note: Option<Note>) {
        self.inner.state.selected_note.set(note);
    }

    /// Re-fetch notes for an explicit folder without changing the
    /// selection.
    pub fn fetch_notes_for_folder(&self, folder_id: Uuid) -> JoinHandle<()> {
        self.spawn_fetch(NotesScope::Folder(folder_id))
    }

    /// Publish every note the user owns, across folders (all-notes view).
    /// Participates in the same fencing generation as folder fetches.
    pub fn fetch_all_notes(&self) -> JoinHandle<()> {
        self.spawn_fetch(NotesScope::AllNotes)
    }

    /// Reload the folder list. The published list excludes the Default
    /// folder, which is exposed separately.
    pub async fn refresh_folders(&self) -> Result<()> {
        let inner = &self.inner;
        let folders = inner.gateway.folders.list(inner.user_id).await?;
        let default_id = inner.state.default_folder.get().map(|f| f.id);
        let filtered: Vec<Folder> = folders
            .into_iter()
            .filter(|f| Some(f.id) != default_id && f.name != DEFAULT_FOLDER_NAME)
            .collect();

        debug!(
            subsystem = "sync",
            component = "session",
            op = "refresh_folders",
            user_id = %inner.user_id,
            result_count = filtered.len(),
            "Folder list published"
        );
        inner.state.folders.set(filtered);
        Ok(())
    }

    fn spawn_fetch(&self, scope: NotesScope) -> JoinHandle<()> {
        let generation = self.inner.fetch_gen.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.state.loading.set(true);
        let inner = self.inner.clone();

        tokio::spawn(async move {
            let result = match scope {
                NotesScope::Folder(folder_id) => {
                    inner
                        .gateway
                        .notes
                        .list_for_folder(inner.user_id, folder_id)
                        .await
                }
                NotesScope::AllNotes => inner.gateway.notes.list_all(inner.user_id).await,
            };

            if inner.fetch_gen.load(Ordering::SeqCst) != generation {
                // A newer scope owns the notes value (and the loading
                // flag); this result must not overwrite it.
                debug!(
                    subsystem = "sync",
                    component = "session",
                    op = "fetch_notes",
                    generation,
                    ?scope,
                    "Dropping stale notes fetch result"
                );
                return;
            }

            match result {
                Ok(notes) => {
                    debug!(
                        subsystem = "sync",
                        component = "session",
                        op = "fetch_notes",
                        generation,
                        result_count = notes.len(),
                        "Notes published"
                    );
                    inner.state.notes.set(notes);
                    inner.state.loading.set(false);
                }
                Err(e) => {
                    warn!(
                        subsystem = "sync",
                        component = "session",
                        op = "fetch_notes",
                        generation,
                        error = %e,
                        "Notes fetch failed"
                    );
                    inner.state.loading.set(false);
                    inner.state.post(StatusMessage::failure("Failed to load notes"));
                }
            }
        })
    }

    // =========================================================================
    // FOLDER MUTATIONS
    // =========================================================================

    /// Create a folder, select it, and refresh the folder list.
    pub async fn add_folder(&self, name: &str) -> Result<Folder> {
        let inner = &self.inner;
        let name = validate_folder_name(name).map_err(|e| self.rejected(e))?;

        let created = async {
            let id = inner.gateway.folders.create(inner.user_id, &name).await?;
            self.grant_creator_permission(id);
            inner
                .gateway
                .folders
                .get(id)
                .await?
                .ok_or(Error::FolderNotFound(id))
        }
        .await;

        match created {
            Ok(folder) => {
                if let Err(e) = self.refresh_folders().await {
                    warn!(
                        subsystem = "sync",
                        component = "session",
                        op = "add_folder",
                        error = %e,
                        "Folder list refresh failed after create"
                    );
                }
                self.select_folder(folder.clone());
                inner
                    .state
                    .post(StatusMessage::success("Folder added successfully"));
                Ok(folder)
            }
            Err(e) => {
                inner
                    .state
                    .post(StatusMessage::failure("Failed to add folder"));
                Err(e)
            }
        }
    }

    /// Rename a folder. The Default folder is protected; empty names are
    /// rejected before any remote call.
    pub async fn rename_folder(&self, folder_id: Uuid, new_name: &str) -> Result<()> {
        let inner = &self.inner;
        self.reject_if_default(folder_id)?;
        let new_name = validate_folder_name(new_name).map_err(|e| self.rejected(e))?;
        self.authorize(folder_id, self.known_folder_owner(folder_id), "Failed to rename folder")
            .await?;

        match inner.gateway.folders.rename(folder_id, &new_name).await {
            Ok(()) => {
                if let Some(selected) = inner.state.selected_folder.get() {
                    if selected.id == folder_id {
                        inner.state.selected_folder.set(Some(Folder {
                            name: new_name.clone(),
                            ..selected
                        }));
                    }
                }
                if let Err(e) = self.refresh_folders().await {
                    warn!(
                        subsystem = "sync",
                        component = "session",
                        op = "rename_folder",
                        error = %e,
                        "Folder list refresh failed after rename"
                    );
                }
                inner
                    .state
                    .post(StatusMessage::success("Folder renamed successfully"));
                Ok(())
            }
            Err(e) => {
                inner
                    .state
                    .post(StatusMessage::failure("Failed to rename folder"));
                Err(e)
            }
        }
    }

    /// Delete a folder and everything in it, two-phase: the folder's notes
    /// first, then the folder record. Note-deletion failure aborts the
    /// folder deletion; folder-deletion failure after the notes are gone
    /// leaves a dangling empty folder, surfaced but not rolled back.
    pub async fn delete_folder(&self, folder_id: Uuid) -> Result<()> {
        let inner = &self.inner;
        self.reject_if_default(folder_id)?;
        self.authorize(folder_id, self.known_folder_owner(folder_id), "Failed to delete folder")
            .await?;

        if let Err(e) = inner
            .gateway
            .notes
            .delete_in_folder(inner.user_id, folder_id)
            .await
        {
            inner
                .state
                .post(StatusMessage::failure("Failed to delete notes in folder"));
            return Err(e);
        }

        if let Err(e) = inner.gateway.folders.delete(folder_id).await {
            inner
                .state
                .post(StatusMessage::failure("Failed to delete folder"));
            return Err(e);
        }

        let remaining: Vec<Folder> = inner
            .state
            .folders
            .get()
            .into_iter()
            .filter(|f| f.id != folder_id)
            .collect();
        inner.state.folders.set(remaining);

        if let Some(default) = inner.state.default_folder.get() {
            self.select_folder(default);
        }
        inner
            .state
            .post(StatusMessage::success("Folder deleted successfully"));
        Ok(())
    }

    // =========================================================================
    // NOTE MUTATIONS
    // =========================================================================

    /// Create a note (draft without id) or update an existing note's title
    /// and content (draft with id). Folder and owner are immutable after
    /// creation. On success, notes for the selected folder are re-fetched.
    pub async fn add_or_update_note(&self, draft: NoteDraft) -> Result<Uuid> {
        let inner = &self.inner;
        validate_note_draft(&draft).map_err(|e| self.rejected(e))?;

        match draft.id {
            None => {
                let inserted = inner
                    .gateway
                    .notes
                    .insert(CreateNoteRequest {
                        folder_id: draft.folder_id,
                        owner_id: inner.user_id,
                        title: draft.title,
                        content: draft.content,
                    })
                    .await;

                match inserted {
                    Ok(id) => {
                        self.grant_creator_permission(id);
                        self.refetch_selected();
                        inner
                            .state
                            .post(StatusMessage::success("Note added successfully"));
                        Ok(id)
                    }
                    Err(e) => {
                        inner
                            .state
                            .post(StatusMessage::failure("Failed to add note"));
                        Err(e)
                    }
                }
            }
            Some(id) => {
                self.authorize(id, self.known_note_owner(id), "Failed to update note")
                    .await?;
                let updated = inner
                    .gateway
                    .notes
                    .update(
                        id,
                        NoteUpdate {
                            title: draft.title,
                            content: draft.content,
                        },
                    )
                    .await;

                match updated {
                    Ok(()) => {
                        self.refetch_selected();
                        inner
                            .state
                            .post(StatusMessage::success("Note updated successfully"));
                        Ok(id)
                    }
                    Err(e) => {
                        inner
                            .state
                            .post(StatusMessage::failure("Failed to update note"));
                        Err(e)
                    }
                }
            }
        }
    }

    /// Delete a note by id. On success the note is removed from the
    /// published list locally (no refetch) and the note selection is
    /// cleared.
    pub async fn delete_note(&self, note_id: Uuid) -> Result<()> {
        let inner = &self.inner;
        self.authorize(note_id, self.known_note_owner(note_id), "Failed to delete note")
            .await?;

        match inner.gateway.notes.delete(note_id).await {
            Ok(()) => {
                let remaining: Vec<Note> = inner
                    .state
                    .notes
                    .get()
                    .into_iter()
                    .filter(|n| n.id != note_id)
                    .collect();
                inner.state.notes.set(remaining);
                inner.state.selected_note.set(None);
                inner
                    .state
                    .post(StatusMessage::success("Note deleted successfully"));
                Ok(())
            }
            Err(e) => {
                inner
                    .state
                    .post(StatusMessage::failure("Failed to delete note"));
                Err(e)
            }
        }
    }

    /// Delete the currently selected note, if any.
    pub async fn delete_selected_note(&self) -> Result<()> {
        match self.inner.state.selected_note.get() {
            Some(note) => self.delete_note(note.id).await,
            None => Ok(()),
        }
    }

    /// Batch-delete every note in the selected folder, then re-fetch
    /// (expected empty). No-op when no folder is selected.
    pub async fn delete_all_notes(&self) -> Result<()> {
        let inner = &self.inner;
        let Some(folder) = inner.state.selected_folder.get() else {
            return Ok(());
        };

        match inner
            .gateway
            .notes
            .delete_in_folder(inner.user_id, folder.id)
            .await
        {
            Ok(()) => {
                self.fetch_notes_for_folder(folder.id);
                inner.state.post(StatusMessage::success(
                    "All notes in the folder deleted successfully",
                ));
                Ok(())
            }
            Err(e) => {
                inner
                    .state
                    .post(StatusMessage::failure("Failed to delete notes in folder"));
                Err(e)
            }
        }
    }

    /// Batch-delete every note the user owns, across folders.
    pub async fn purge_all_notes(&self) -> Result<()> {
        let inner = &self.inner;
        match inner.gateway.notes.delete_all_for_owner(inner.user_id).await {
            Ok(()) => {
                self.refetch_selected();
                inner
                    .state
                    .post(StatusMessage::success("All notes deleted successfully"));
                Ok(())
            }
            Err(e) => {
                inner
                    .state
                    .post(StatusMessage::failure("Failed to delete notes"));
                Err(e)
            }
        }
    }

    /// Resolve a single note for detail views. Publishes nothing.
    pub async fn note_by_id(&self, id: Uuid) -> Result<Option<Note>> {
        self.inner.gateway.notes.fetch(id).await
    }

    // =========================================================================
    // TEARDOWN
    // =========================================================================

    /// Reset all published state, as on logout. Bumps the fetch generation
    /// so in-flight fetches cannot republish into the cleared state. No
    /// remote data is touched.
    pub(crate) fn clear_local_state(&self) {
        let inner = &self.inner;
        inner.fetch_gen.fetch_add(1, Ordering::SeqCst);
        inner.state.folders.set(Vec::new());
        inner.state.notes.set(Vec::new());
        inner.state.selected_folder.set(None);
        inner.state.selected_note.set(None);
        inner.state.default_folder.set(None);
        inner.state.loading.set(false);
        info!(
            subsystem = "sync",
            component = "session",
            op = "clear",
            user_id = %inner.user_id,
            "Session state cleared"
        );
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn default_folder_id(&self) -> Option<Uuid> {
        self.inner.state.default_folder.get().map(|f| f.id)
    }

    /// Guard: the Default folder is never renamed or deleted. Rejected
    /// with the fixed message, before any remote call.
    fn reject_if_default(&self, folder_id: Uuid) -> Result<()> {
        if self.default_folder_id() == Some(folder_id) {
            return Err(self.rejected(Error::DefaultFolderProtected));
        }
        Ok(())
    }

    /// Post a local rejection message and hand the error back.
    fn rejected(&self, err: Error) -> Error {
        self.inner.state.post(StatusMessage::rejected(err.to_string()));
        err
    }

    /// Require edit rights on a resource: the session user owns it, or a
    /// permission record with `can_edit` exists. Posts the appropriate
    /// message on denial or check failure.
    async fn authorize(
        &self,
        resource_id: Uuid,
        known_owner: Option<Uuid>,
        fail_text: &str,
    ) -> Result<()> {
        let inner = &self.inner;
        if known_owner == Some(inner.user_id) {
            return Ok(());
        }

        match inner.gateway.permissions.get(resource_id, inner.user_id).await {
            Ok(Some(p)) if p.can_edit => Ok(()),
            Ok(_) => {
                let err = Error::Forbidden("no edit permission for this item".to_string());
                Err(self.rejected(err))
            }
            Err(e) => {
                inner.state.post(StatusMessage::failure(fail_text));
                Err(e)
            }
        }
    }

    /// Owner of a folder, if it is already known locally.
    fn known_folder_owner(&self, folder_id: Uuid) -> Option<Uuid> {
        let state = &self.inner.state;
        if let Some(f) = state.selected_folder.get() {
            if f.id == folder_id {
                return Some(f.owner_id);
            }
        }
        if let Some(f) = state.default_folder.get() {
            if f.id == folder_id {
                return Some(f.owner_id);
            }
        }
        state
            .folders
            .get()
            .iter()
            .find(|f| f.id == folder_id)
            .map(|f| f.owner_id)
    }

    /// Owner of a note, if it is already known locally.
    fn known_note_owner(&self, note_id: Uuid) -> Option<Uuid> {
        let state = &self.inner.state;
        if let Some(n) = state.selected_note.get() {
            if n.id == note_id {
                return Some(n.owner_id);
            }
        }
        state
            .notes
            .get()
            .iter()
            .find(|n| n.id == note_id)
            .map(|n| n.owner_id)
    }

    /// Re-fetch notes for the selected folder, if any.
    fn refetch_selected(&self) {
        if let Some(folder) = self.inner.state.selected_folder.get() {
            self.fetch_notes_for_folder(folder.id);
        }
    }

    /// Grant the creator full access to a new resource. Fire-and-forget:
    /// the result is logged, never awaited by the calling operation.
    fn grant_creator_permission(&self, resource_id: Uuid) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            if let Err(e) = inner
                .gateway
                .permissions
                .set(resource_id, inner.user_id, Permission::full())
                .await
            {
                warn!(
                    subsystem = "sync",
                    component = "session",
                    op = "grant_permission",
                    user_id = %inner.user_id,
                    error = %e,
                    "Creator permission write failed"
                );
            }
        });
    }
}

/// Trim and bound a folder name. Empty input is rejected before any remote
/// call is made.
fn validate_folder_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("Folder name cannot be empty".to_string()));
    }
    if name.len() > NAME_MAX_LEN {
        return Err(Error::InvalidInput("Folder name is too long".to_string()));
    }
    Ok(name.to_string())
}

/// A note draft must carry a non-blank title and content.
fn validate_note_draft(draft: &NoteDraft) -> Result<()> {
    if draft.title.trim().is_empty() || draft.content.trim().is_empty() {
        return Err(Error::InvalidInput(
            "Note title and content cannot be empty".to_string(),
        ));
    }
    if draft.title.trim().len() > NAME_MAX_LEN {
        return Err(Error::InvalidInput("Note title is too long".to_string()));
    }
    Ok(())
}
