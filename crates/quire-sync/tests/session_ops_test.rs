//! Behavior tests for session folder/note operations.
//!
//! This test suite validates:
//! - Default-folder bootstrap, idempotence, and selection
//! - The Default-folder guard (fixed rejection, no remote call)
//! - Client-side validation (no remote call on blank input)
//! - Create/rename/delete flows and their status messages
//! - Two-phase folder deletion (notes first, folder second)
//! - Optimistic local removal on note delete
//! - Permission enforcement on foreign resources

use std::time::Duration;

use quire_core::{defaults::DEFAULT_FOLDER_NAME, CreateNoteRequest, Error, NoteDraft, NoteStore, Permission, PermissionStore};
use quire_store::MemoryStore;
use quire_sync::{MessageKind, SessionState, SyncConfig, SyncSession};

async fn new_session() -> (MemoryStore, SyncSession) {
    let store = MemoryStore::new();
    let session = SyncSession::new(store.gateway(), quire_core::new_v7(), &SyncConfig::default());
    session
        .bootstrap()
        .await
        .expect("bootstrap against empty store");
    settle(session.state()).await;
    (store, session)
}

/// Wait until no notes fetch is in flight.
async fn settle(state: &SessionState) {
    let mut rx = state.loading.subscribe();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while *rx.borrow() {
        tokio::time::timeout_at(deadline, rx.changed())
            .await
            .expect("loading flag stuck")
            .expect("loading channel closed");
    }
}

// =============================================================================
// BOOTSTRAP & DEFAULT FOLDER
// =============================================================================

#[tokio::test]
async fn test_bootstrap_creates_and_selects_default_folder() {
    let (store, session) = new_session().await;
    let state = session.state();

    let default = state.default_folder.get().expect("default folder resolved");
    assert_eq!(default.name, DEFAULT_FOLDER_NAME);
    assert_eq!(default.owner_id, session.user_id());

    let selected = state.selected_folder.get().expect("default selected");
    assert_eq!(selected.id, default.id);

    // The Default folder is published separately, never in the list.
    assert!(state.folders.get().is_empty());
    assert!(state.notes.get().is_empty());
    assert!(!state.loading.get());

    assert_eq!(store.all_folders().await.len(), 1);
}

#[tokio::test]
async fn test_ensure_default_folder_is_idempotent() {
    let (store, session) = new_session().await;

    let first = session.ensure_default_folder().await.unwrap();
    let second = session.ensure_default_folder().await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(store.all_folders().await.len(), 1);
}

#[tokio::test]
async fn test_creator_permission_granted_on_default_folder() {
    let (store, session) = new_session().await;
    let default_id = session.state().default_folder.get().unwrap().id;

    // The grant is fire-and-forget; wait for the write to land.
    let mut granted = None;
    for _ in 0..500 {
        granted = PermissionStore::get(&store, default_id, session.user_id())
            .await
            .unwrap();
        if granted.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(
        granted.expect("creator permission grant never reached the store"),
        Permission::full()
    );
}

// =============================================================================
// GUARD & VALIDATION
// =============================================================================

#[tokio::test]
async fn test_default_folder_rename_and_delete_always_rejected() {
    let (store, session) = new_session().await;
    let default_id = session.state().default_folder.get().unwrap().id;
    let mut messages = session.state().subscribe_messages();
    store.reset_calls().await;

    let err = session.rename_folder(default_id, "Renamed").await.unwrap_err();
    assert!(matches!(err, Error::DefaultFolderProtected));
    let msg = messages.recv().await.unwrap();
    assert_eq!(msg.kind, MessageKind::Rejected);
    assert_eq!(msg.text, "The Default folder cannot be renamed or deleted");

    let err = session.delete_folder(default_id).await.unwrap_err();
    assert!(matches!(err, Error::DefaultFolderProtected));
    let msg = messages.recv().await.unwrap();
    assert_eq!(msg.kind, MessageKind::Rejected);
    assert_eq!(msg.text, "The Default folder cannot be renamed or deleted");

    // The guard fires before any remote call.
    assert_eq!(store.call_count("folders.rename").await, 0);
    assert_eq!(store.call_count("folders.delete").await, 0);
    assert_eq!(store.call_count("notes.delete_in_folder").await, 0);
}

#[tokio::test]
async fn test_blank_rename_rejected_without_remote_call() {
    let (store, session) = new_session().await;
    let folder = session.add_folder("Work").await.unwrap();
    settle(session.state()).await;

    let mut messages = session.state().subscribe_messages();
    store.reset_calls().await;

    let err = session.rename_folder(folder.id, "   ").await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(messages.recv().await.unwrap().kind, MessageKind::Rejected);
    assert!(store.calls().await.is_empty(), "no remote call on validation failure");
}

#[tokio::test]
async fn test_blank_note_draft_rejected_without_remote_call() {
    let (store, session) = new_session().await;
    let folder_id = session.state().selected_folder.get().unwrap().id;

    let mut messages = session.state().subscribe_messages();
    store.reset_calls().await;

    for draft in [
        NoteDraft::new(folder_id, "", "content"),
        NoteDraft::new(folder_id, "title", "   "),
    ] {
        let err = session.add_or_update_note(draft).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(messages.recv().await.unwrap().kind, MessageKind::Rejected);
    }
    assert!(store.calls().await.is_empty());
}

// =============================================================================
// FOLDER FLOWS
// =============================================================================

#[tokio::test]
async fn test_add_folder_selects_and_publishes() {
    let (_store, session) = new_session().await;
    let mut messages = session.state().subscribe_messages();

    let folder = session.add_folder("  Work  ").await.unwrap();
    settle(session.state()).await;

    assert_eq!(folder.name, "Work", "name is trimmed before the remote call");
    assert_eq!(session.state().selected_folder.get().unwrap().id, folder.id);
    let published = session.state().folders.get();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].id, folder.id);

    let msg = messages.recv().await.unwrap();
    assert_eq!(msg.kind, MessageKind::Success);
    assert_eq!(msg.text, "Folder added successfully");
}

#[tokio::test]
async fn test_add_folder_failure_leaves_state_unchanged() {
    let (store, session) = new_session().await;
    let default_id = session.state().default_folder.get().unwrap().id;
    let mut messages = session.state().subscribe_messages();

    store.fail_next("folders.create").await;
    let err = session.add_folder("Work").await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));

    let msg = messages.recv().await.unwrap();
    assert_eq!(msg.kind, MessageKind::Failure);
    assert_eq!(msg.text, "Failed to add folder");

    assert!(session.state().folders.get().is_empty());
    assert_eq!(session.state().selected_folder.get().unwrap().id, default_id);
}

#[tokio::test]
async fn test_rename_selected_folder_republishes_selection() {
    let (_store, session) = new_session().await;
    let folder = session.add_folder("Work").await.unwrap();
    settle(session.state()).await;

    session.rename_folder(folder.id, "Projects").await.unwrap();
    settle(session.state()).await;

    let selected = session.state().selected_folder.get().unwrap();
    assert_eq!(selected.id, folder.id);
    assert_eq!(selected.name, "Projects");
    assert_eq!(session.state().folders.get()[0].name, "Projects");
}

#[tokio::test]
async fn test_rename_unselected_folder_keeps_selection() {
    let (_store, session) = new_session().await;
    let work = session.add_folder("Work").await.unwrap();
    let home = session.add_folder("Home").await.unwrap();
    settle(session.state()).await;
    assert_eq!(session.state().selected_folder.get().unwrap().id, home.id);

    session.rename_folder(work.id, "Projects").await.unwrap();
    settle(session.state()).await;

    // Selection untouched; list reflects the rename.
    assert_eq!(session.state().selected_folder.get().unwrap().id, home.id);
    let names: Vec<String> = session
        .state()
        .folders
        .get()
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert!(names.contains(&"Projects".to_string()));
    assert!(!names.contains(&"Work".to_string()));
}

#[tokio::test]
async fn test_delete_folder_cascades_then_reselects_default() {
    let (store, session) = new_session().await;
    let default_id = session.state().default_folder.get().unwrap().id;
    let folder = session.add_folder("Doomed").await.unwrap();
    settle(session.state()).await;

    for i in 0..3 {
        session
            .add_or_update_note(NoteDraft::new(folder.id, format!("n{i}"), "body"))
            .await
            .unwrap();
    }
    settle(session.state()).await;
    assert_eq!(session.state().notes.get().len(), 3);

    let mut messages = session.state().subscribe_messages();
    session.delete_folder(folder.id).await.unwrap();
    settle(session.state()).await;

    // All notes of the folder are gone, then the folder itself.
    assert!(store.all_notes().await.iter().all(|n| n.folder_id != folder.id));
    assert!(store.all_folders().await.iter().all(|f| f.id != folder.id));
    assert!(session.state().folders.get().is_empty());

    // Selection falls back to the Default folder, notes refreshed.
    assert_eq!(session.state().selected_folder.get().unwrap().id, default_id);
    assert!(session.state().notes.get().is_empty());

    assert_eq!(messages.recv().await.unwrap().text, "Folder deleted successfully");
}

#[tokio::test]
async fn test_delete_folder_aborts_when_note_deletion_fails() {
    let (store, session) = new_session().await;
    let folder = session.add_folder("Sticky").await.unwrap();
    session
        .add_or_update_note(NoteDraft::new(folder.id, "keep", "me"))
        .await
        .unwrap();
    settle(session.state()).await;

    let mut messages = session.state().subscribe_messages();
    store
        .fail_next(format!("notes.delete_in_folder:{}", folder.id))
        .await;

    let err = session.delete_folder(folder.id).await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));

    // Nothing was deleted: the folder record was never touched.
    assert!(store.all_folders().await.iter().any(|f| f.id == folder.id));
    assert_eq!(store.all_notes().await.len(), 1);
    assert_eq!(session.state().folders.get().len(), 1);
    assert_eq!(session.state().selected_folder.get().unwrap().id, folder.id);

    let msg = messages.recv().await.unwrap();
    assert_eq!(msg.kind, MessageKind::Failure);
    assert_eq!(msg.text, "Failed to delete notes in folder");
}

#[tokio::test]
async fn test_delete_folder_surfaces_dangling_folder_without_rollback() {
    let (store, session) = new_session().await;
    let folder = session.add_folder("HalfGone").await.unwrap();
    session
        .add_or_update_note(NoteDraft::new(folder.id, "t", "c"))
        .await
        .unwrap();
    settle(session.state()).await;

    let mut messages = session.state().subscribe_messages();
    store.fail_next(format!("folders.delete:{}", folder.id)).await;

    let err = session.delete_folder(folder.id).await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));

    // Notes are gone, the folder remains: dangling but surfaced.
    assert!(store.all_notes().await.is_empty());
    assert!(store.all_folders().await.iter().any(|f| f.id == folder.id));
    assert_eq!(messages.recv().await.unwrap().text, "Failed to delete folder");
}

// =============================================================================
// NOTE FLOWS
// =============================================================================

#[tokio::test]
async fn test_add_note_round_trip() {
    let (_store, session) = new_session().await;
    let folder = session.add_folder("Work").await.unwrap();
    settle(session.state()).await;

    let id = session
        .add_or_update_note(NoteDraft::new(folder.id, "Groceries", "milk, eggs"))
        .await
        .unwrap();
    settle(session.state()).await;

    let notes = session.state().notes.get();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].id, id);
    assert!(!notes[0].id.is_nil());
    assert_eq!(notes[0].title, "Groceries");
    assert_eq!(notes[0].content, "milk, eggs");
    assert_eq!(notes[0].folder_id, folder.id);
    assert_eq!(notes[0].owner_id, session.user_id());
}

#[tokio::test]
async fn test_update_note_keeps_folder_and_owner() {
    let (_store, session) = new_session().await;
    let folder = session.add_folder("Work").await.unwrap();
    settle(session.state()).await;

    let id = session
        .add_or_update_note(NoteDraft::new(folder.id, "v1", "first"))
        .await
        .unwrap();
    settle(session.state()).await;

    let mut draft = NoteDraft::new(folder.id, "v2", "second");
    draft.id = Some(id);
    let updated_id = session.add_or_update_note(draft).await.unwrap();
    settle(session.state()).await;

    assert_eq!(updated_id, id);
    let notes = session.state().notes.get();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "v2");
    assert_eq!(notes[0].content, "second");
    assert_eq!(notes[0].folder_id, folder.id);
    assert!(notes[0].updated_at_utc >= notes[0].created_at_utc);
}

#[tokio::test]
async fn test_delete_note_removes_locally_without_refetch() {
    let (store, session) = new_session().await;
    let folder = session.add_folder("Work").await.unwrap();
    settle(session.state()).await;

    let keep = session
        .add_or_update_note(NoteDraft::new(folder.id, "keep", "k"))
        .await
        .unwrap();
    let doomed = session
        .add_or_update_note(NoteDraft::new(folder.id, "doomed", "d"))
        .await
        .unwrap();
    settle(session.state()).await;
    session.select_note(session.state().notes.get().iter().find(|n| n.id == doomed).cloned());

    store.reset_calls().await;
    let mut messages = session.state().subscribe_messages();
    session.delete_note(doomed).await.unwrap();

    let notes = session.state().notes.get();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].id, keep);
    assert!(session.state().selected_note.get().is_none());

    // Optimistic removal: no list query was issued.
    assert_eq!(store.call_count("notes.list_for_folder").await, 0);
    assert_eq!(messages.recv().await.unwrap().text, "Note deleted successfully");
}

#[tokio::test]
async fn test_delete_note_failure_leaves_notes_unchanged() {
    let (store, session) = new_session().await;
    let folder = session.add_folder("Work").await.unwrap();
    settle(session.state()).await;
    let id = session
        .add_or_update_note(NoteDraft::new(folder.id, "t", "c"))
        .await
        .unwrap();
    settle(session.state()).await;

    let mut messages = session.state().subscribe_messages();
    store.fail_next(format!("notes.delete:{id}")).await;

    let err = session.delete_note(id).await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    assert_eq!(session.state().notes.get().len(), 1);
    assert_eq!(messages.recv().await.unwrap().text, "Failed to delete note");
}

#[tokio::test]
async fn test_delete_selected_note_without_selection_is_noop() {
    let (store, session) = new_session().await;
    store.reset_calls().await;

    session.delete_selected_note().await.unwrap();
    assert_eq!(store.call_count("notes.delete").await, 0);
}

#[tokio::test]
async fn test_delete_all_notes_in_selected_folder() {
    let (store, session) = new_session().await;
    let folder = session.add_folder("Work").await.unwrap();
    settle(session.state()).await;

    for i in 0..4 {
        session
            .add_or_update_note(NoteDraft::new(folder.id, format!("n{i}"), "x"))
            .await
            .unwrap();
    }
    settle(session.state()).await;
    assert_eq!(session.state().notes.get().len(), 4);

    let mut messages = session.state().subscribe_messages();
    session.delete_all_notes().await.unwrap();
    settle(session.state()).await;

    assert!(session.state().notes.get().is_empty());
    assert!(store.all_notes().await.is_empty());
    assert_eq!(
        messages.recv().await.unwrap().text,
        "All notes in the folder deleted successfully"
    );
}

#[tokio::test]
async fn test_purge_all_notes_across_folders() {
    let (store, session) = new_session().await;
    let work = session.add_folder("Work").await.unwrap();
    let home = session.add_folder("Home").await.unwrap();
    settle(session.state()).await;

    session
        .add_or_update_note(NoteDraft::new(work.id, "w", "1"))
        .await
        .unwrap();
    session
        .add_or_update_note(NoteDraft::new(home.id, "h", "2"))
        .await
        .unwrap();
    settle(session.state()).await;

    session.purge_all_notes().await.unwrap();
    settle(session.state()).await;

    assert!(store.all_notes().await.is_empty());
    assert!(session.state().notes.get().is_empty());
}

#[tokio::test]
async fn test_note_by_id_resolves_single_note() {
    let (_store, session) = new_session().await;
    let folder = session.add_folder("Work").await.unwrap();
    settle(session.state()).await;
    let id = session
        .add_or_update_note(NoteDraft::new(folder.id, "detail", "view"))
        .await
        .unwrap();
    settle(session.state()).await;

    let note = session.note_by_id(id).await.unwrap().expect("note exists");
    assert_eq!(note.title, "detail");
    assert!(session.note_by_id(quire_core::new_v7()).await.unwrap().is_none());
}

// =============================================================================
// SCENARIO (work → groceries → projects)
// =============================================================================

#[tokio::test]
async fn test_scenario_rename_keeps_note_list() {
    let (_store, session) = new_session().await;

    let work = session.add_folder("Work").await.unwrap();
    settle(session.state()).await;

    session
        .add_or_update_note(NoteDraft::new(work.id, "Groceries", "milk, eggs"))
        .await
        .unwrap();
    settle(session.state()).await;

    session.rename_folder(work.id, "Projects").await.unwrap();
    settle(session.state()).await;

    let selected = session.state().selected_folder.get().unwrap();
    assert_eq!(selected.name, "Projects");

    let notes = session.state().notes.get();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Groceries");
    assert_eq!(notes[0].content, "milk, eggs");
}

// =============================================================================
// PERMISSION ENFORCEMENT
// =============================================================================

#[tokio::test]
async fn test_foreign_note_update_forbidden_without_grant() {
    let (store, session) = new_session().await;
    let stranger = quire_core::new_v7();
    let folder = session.add_folder("Shared").await.unwrap();
    settle(session.state()).await;

    let foreign_id = NoteStore::insert(
        &store,
        CreateNoteRequest {
            folder_id: folder.id,
            owner_id: stranger,
            title: "theirs".into(),
            content: "hands off".into(),
        },
    )
    .await
    .unwrap();

    store.reset_calls().await;
    let mut messages = session.state().subscribe_messages();
    let mut draft = NoteDraft::new(folder.id, "mine now", "x");
    draft.id = Some(foreign_id);

    let err = session.add_or_update_note(draft.clone()).await.unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
    assert_eq!(messages.recv().await.unwrap().kind, MessageKind::Rejected);
    assert_eq!(store.call_count("notes.update").await, 0);

    // A read-only grant is not enough.
    PermissionStore::set(&store, foreign_id, session.user_id(), Permission::read_only())
        .await
        .unwrap();
    assert!(matches!(
        session.add_or_update_note(draft.clone()).await.unwrap_err(),
        Error::Forbidden(_)
    ));

    // An edit grant unlocks the update.
    PermissionStore::set(&store, foreign_id, session.user_id(), Permission::full())
        .await
        .unwrap();
    session.add_or_update_note(draft).await.unwrap();
    settle(session.state()).await;

    let note = session.note_by_id(foreign_id).await.unwrap().unwrap();
    assert_eq!(note.title, "mine now");
    assert_eq!(note.owner_id, stranger, "ownership never transfers");
}

#[tokio::test]
async fn test_own_resources_need_no_permission_lookup() {
    let (store, session) = new_session().await;
    let folder = session.add_folder("Mine").await.unwrap();
    settle(session.state()).await;

    store.reset_calls().await;
    session.rename_folder(folder.id, "Still Mine").await.unwrap();

    // Ownership is known locally; no permission read is issued.
    assert_eq!(store.call_count("permissions.get").await, 0);
}
