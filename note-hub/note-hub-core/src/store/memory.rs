//! In-memory [`EntityStore`] keyed by id, used by the server binary
//! and by tests. Each operation takes the lock once, so writes are
//! atomic per record and nothing more.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Folder, Note, UserSpace};
use crate::store::EntityStore;

#[derive(Default)]
struct Shelves {
    spaces: HashMap<Uuid, UserSpace>,
    folders: HashMap<Uuid, Folder>,
    notes: HashMap<Uuid, Note>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Shelves>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn user_space(&self, id: Uuid) -> Result<Option<UserSpace>, StoreError> {
        Ok(self.inner.read().spaces.get(&id).cloned())
    }

    async fn user_space_by_key(&self, tenant_key: &str) -> Result<Option<UserSpace>, StoreError> {
        Ok(self
            .inner
            .read()
            .spaces
            .values()
            .find(|s| s.tenant_key == tenant_key)
            .cloned())
    }

    async fn insert_user_space(&self, space: UserSpace) -> Result<(), StoreError> {
        self.inner.write().spaces.insert(space.id, space);
        Ok(())
    }

    async fn delete_user_space(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.write().spaces.remove(&id).is_some())
    }

    async fn folder(&self, id: Uuid) -> Result<Option<Folder>, StoreError> {
        Ok(self.inner.read().folders.get(&id).cloned())
    }

    async fn folders_in_space(&self, user_space_id: Uuid) -> Result<Vec<Folder>, StoreError> {
        Ok(self
            .inner
            .read()
            .folders
            .values()
            .filter(|f| f.user_space_id == user_space_id)
            .cloned()
            .collect())
    }

    async fn child_folders(&self, parent_id: Uuid) -> Result<Vec<Folder>, StoreError> {
        Ok(self
            .inner
            .read()
            .folders
            .values()
            .filter(|f| f.parent_id == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn insert_folder(&self, folder: Folder) -> Result<(), StoreError> {
        self.inner.write().folders.insert(folder.id, folder);
        Ok(())
    }

    async fn update_folder(&self, folder: Folder) -> Result<bool, StoreError> {
        let mut inner = self.inner.write();
        if !inner.folders.contains_key(&folder.id) {
            return Ok(false);
        }
        inner.folders.insert(folder.id, folder);
        Ok(true)
    }

    async fn delete_folder(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.write().folders.remove(&id).is_some())
    }

    async fn note(&self, id: Uuid) -> Result<Option<Note>, StoreError> {
        Ok(self.inner.read().notes.get(&id).cloned())
    }

    async fn notes_in_space(&self, user_space_id: Uuid) -> Result<Vec<Note>, StoreError> {
        Ok(self
            .inner
            .read()
            .notes
            .values()
            .filter(|n| n.user_space_id == user_space_id)
            .cloned()
            .collect())
    }

    async fn child_notes(&self, parent_id: Uuid) -> Result<Vec<Note>, StoreError> {
        Ok(self
            .inner
            .read()
            .notes
            .values()
            .filter(|n| n.parent_id == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn insert_note(&self, note: Note) -> Result<(), StoreError> {
        self.inner.write().notes.insert(note.id, note);
        Ok(())
    }

    async fn update_note(&self, note: Note) -> Result<bool, StoreError> {
        let mut inner = self.inner.write();
        if !inner.notes.contains_key(&note.id) {
            return Ok(false);
        }
        inner.notes.insert(note.id, note);
        Ok(true)
    }

    async fn delete_note(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.write().notes.remove(&id).is_some())
    }
}
