//! Hermetic in-memory remote store.
//!
//! Implements the full gateway contract over locked maps, for tests and
//! embedders that need a backend without external services. Two test
//! controls make the synchronization core's ordering rules reproducible:
//!
//! - **fault injection** — [`MemoryStore::fail_next`] makes the next call
//!   matching an op key fail with [`Error::Store`];
//! - **completion gating** — [`MemoryStore::hold`] blocks calls matching an
//!   op key until the returned [`GateHandle`] is released, forcing any
//!   cross-request completion order.
//!
//! Op keys are `"<entity>.<op>"`, optionally suffixed with the scoping id,
//! e.g. `"notes.list_for_folder:<folder_id>"`. Controls registered under
//! the unscoped base key match every scoped call of that op.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock, Semaphore};
use uuid::Uuid;

use quire_core::{
    new_v7, CreateNoteRequest, Error, Folder, FolderStore, Gateway, Note, NoteStore, NoteUpdate,
    Permission, PermissionStore, Result,
};

/// Handle to a registered gate; calls matching the key block until
/// [`release`](GateHandle::release) is invoked once per blocked call.
pub struct GateHandle {
    sem: Arc<Semaphore>,
}

impl GateHandle {
    /// Let one blocked (or future) call through.
    pub fn release(&self) {
        self.sem.add_permits(1);
    }

    /// Let `n` calls through.
    pub fn release_many(&self, n: usize) {
        self.sem.add_permits(n);
    }
}

#[derive(Default)]
struct StoreData {
    folders: HashMap<Uuid, Folder>,
    notes: HashMap<Uuid, Note>,
    permissions: HashMap<(Uuid, Uuid), Permission>,
}

#[derive(Default)]
struct MemoryInner {
    data: RwLock<StoreData>,
    failures: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    calls: Mutex<Vec<String>>,
}

/// In-memory implementation of the remote-store gateway.
///
/// Cheap to clone; all clones share the same maps and test controls.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a [`Gateway`] over this store.
    pub fn gateway(&self) -> Gateway {
        Gateway::from_store(Arc::new(self.clone()))
    }

    /// Make the next call matching `key` (exact or base) fail.
    pub async fn fail_next(&self, key: impl Into<String>) {
        self.inner.failures.lock().await.insert(key.into());
    }

    /// Register a gate for `key`; matching calls block until released.
    pub async fn hold(&self, key: impl Into<String>) -> GateHandle {
        let sem = Arc::new(Semaphore::new(0));
        self.inner.gates.lock().await.insert(key.into(), sem.clone());
        GateHandle { sem }
    }

    /// Every op key recorded since construction or the last
    /// [`reset_calls`](MemoryStore::reset_calls).
    pub async fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().await.clone()
    }

    /// Number of recorded calls matching `base` exactly or as a
    /// `base:<scope>` prefix.
    pub async fn call_count(&self, base: &str) -> usize {
        let prefix = format!("{base}:");
        self.inner
            .calls
            .lock()
            .await
            .iter()
            .filter(|k| *k == base || k.starts_with(&prefix))
            .count()
    }

    /// Forget recorded calls.
    pub async fn reset_calls(&self) {
        self.inner.calls.lock().await.clear();
    }

    /// Snapshot of all folders, for assertions.
    pub async fn all_folders(&self) -> Vec<Folder> {
        self.inner.data.read().await.folders.values().cloned().collect()
    }

    /// Snapshot of all notes, for assertions.
    pub async fn all_notes(&self) -> Vec<Note> {
        self.inner.data.read().await.notes.values().cloned().collect()
    }

    /// Record the call, wait on any matching gate, then apply any pending
    /// injected failure. Must not hold data locks across the gate wait.
    async fn enter(&self, key: String) -> Result<()> {
        self.inner.calls.lock().await.push(key.clone());

        let base = key.split(':').next().unwrap_or(&key).to_string();

        let gate = {
            let gates = self.inner.gates.lock().await;
            gates.get(&key).cloned().or_else(|| gates.get(&base).cloned())
        };
        if let Some(sem) = gate {
            let permit = sem
                .acquire()
                .await
                .map_err(|_| Error::Internal("store gate closed".to_string()))?;
            permit.forget();
        }

        let mut failures = self.inner.failures.lock().await;
        if failures.remove(&key) || failures.remove(&base) {
            return Err(Error::Store(format!("injected failure: {key}")));
        }
        Ok(())
    }
}

#[async_trait]
impl FolderStore for MemoryStore {
    async fn create(&self, owner: Uuid, name: &str) -> Result<Uuid> {
        self.enter("folders.create".to_string()).await?;

        let id = new_v7();
        let now = Utc::now();
        self.inner.data.write().await.folders.insert(
            id,
            Folder {
                id,
                name: name.to_string(),
                owner_id: owner,
                created_at_utc: now,
                updated_at_utc: now,
            },
        );
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Folder>> {
        self.enter(format!("folders.get:{id}")).await?;
        Ok(self.inner.data.read().await.folders.get(&id).cloned())
    }

    async fn find_by_name(&self, owner: Uuid, name: &str) -> Result<Option<Folder>> {
        self.enter("folders.find_by_name".to_string()).await?;

        // Limit-1 semantics: oldest id wins, matching the Postgres store.
        Ok(self
            .inner
            .data
            .read()
            .await
            .folders
            .values()
            .filter(|f| f.owner_id == owner && f.name == name)
            .min_by_key(|f| f.id)
            .cloned())
    }

    async fn list(&self, owner: Uuid) -> Result<Vec<Folder>> {
        self.enter("folders.list".to_string()).await?;

        let mut folders: Vec<Folder> = self
            .inner
            .data
            .read()
            .await
            .folders
            .values()
            .filter(|f| f.owner_id == owner)
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(folders)
    }

    async fn rename(&self, id: Uuid, new_name: &str) -> Result<()> {
        self.enter(format!("folders.rename:{id}")).await?;

        let mut data = self.inner.data.write().await;
        let folder = data.folders.get_mut(&id).ok_or(Error::FolderNotFound(id))?;
        folder.name = new_name.to_string();
        folder.updated_at_utc = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.enter(format!("folders.delete:{id}")).await?;

        let mut data = self.inner.data.write().await;
        // Parity with the Postgres FK: a folder still containing notes
        // cannot be deleted.
        if data.notes.values().any(|n| n.folder_id == id) {
            return Err(Error::Store(format!("folder {id} still contains notes")));
        }
        data.folders
            .remove(&id)
            .map(|_| ())
            .ok_or(Error::FolderNotFound(id))
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn insert(&self, req: CreateNoteRequest) -> Result<Uuid> {
        self.enter("notes.insert".to_string()).await?;

        let id = new_v7();
        let now = Utc::now();
        self.inner.data.write().await.notes.insert(
            id,
            Note {
                id,
                folder_id: req.folder_id,
                title: req.title,
                content: req.content,
                owner_id: req.owner_id,
                created_at_utc: now,
                updated_at_utc: now,
            },
        );
        Ok(id)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Note>> {
        self.enter(format!("notes.fetch:{id}")).await?;
        Ok(self.inner.data.read().await.notes.get(&id).cloned())
    }

    async fn list_for_folder(&self, owner: Uuid, folder_id: Uuid) -> Result<Vec<Note>> {
        self.enter(format!("notes.list_for_folder:{folder_id}"))
            .await?;

        let mut notes: Vec<Note> = self
            .inner
            .data
            .read()
            .await
            .notes
            .values()
            .filter(|n| n.owner_id == owner && n.folder_id == folder_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| a.created_at_utc.cmp(&b.created_at_utc).then(a.id.cmp(&b.id)));
        Ok(notes)
    }

    async fn list_all(&self, owner: Uuid) -> Result<Vec<Note>> {
        self.enter("notes.list_all".to_string()).await?;

        let mut notes: Vec<Note> = self
            .inner
            .data
            .read()
            .await
            .notes
            .values()
            .filter(|n| n.owner_id == owner)
            .cloned()
            .collect();
        notes.sort_by(|a, b| a.created_at_utc.cmp(&b.created_at_utc).then(a.id.cmp(&b.id)));
        Ok(notes)
    }

    async fn update(&self, id: Uuid, update: NoteUpdate) -> Result<()> {
        self.enter(format!("notes.update:{id}")).await?;

        let mut data = self.inner.data.write().await;
        let note = data.notes.get_mut(&id).ok_or(Error::NoteNotFound(id))?;
        note.title = update.title;
        note.content = update.content;
        note.updated_at_utc = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.enter(format!("notes.delete:{id}")).await?;

        self.inner
            .data
            .write()
            .await
            .notes
            .remove(&id)
            .map(|_| ())
            .ok_or(Error::NoteNotFound(id))
    }

    async fn delete_in_folder(&self, owner: Uuid, folder_id: Uuid) -> Result<()> {
        self.enter(format!("notes.delete_in_folder:{folder_id}"))
            .await?;

        self.inner
            .data
            .write()
            .await
            .notes
            .retain(|_, n| !(n.owner_id == owner && n.folder_id == folder_id));
        Ok(())
    }

    async fn delete_all_for_owner(&self, owner: Uuid) -> Result<()> {
        self.enter("notes.delete_all_for_owner".to_string()).await?;

        self.inner
            .data
            .write()
            .await
            .notes
            .retain(|_, n| n.owner_id != owner);
        Ok(())
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn set(&self, resource_id: Uuid, user_id: Uuid, permission: Permission) -> Result<()> {
        self.enter("permissions.set".to_string()).await?;

        self.inner
            .data
            .write()
            .await
            .permissions
            .insert((resource_id, user_id), permission);
        Ok(())
    }

    async fn get(&self, resource_id: Uuid, user_id: Uuid) -> Result<Option<Permission>> {
        self.enter("permissions.get".to_string()).await?;

        Ok(self
            .inner
            .data
            .read()
            .await
            .permissions
            .get(&(resource_id, user_id))
            .copied())
    }
}
