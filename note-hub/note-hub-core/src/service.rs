//! Mutation operations over the folder/note hierarchy.
//!
//! Each operation is stateless per call: it validates its inputs
//! against the store's current snapshot (ownership, existence, cycle
//! checks) and then writes through. Validation reads and the final
//! write are not covered by a transaction; a concurrent mutation of
//! the same subtree in between is an accepted race.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{EntityKind, HierarchyError, Result};
use crate::hierarchy::{
    cascade_delete_folder, is_ancestor, require_owned_folder, require_owned_note, CancelFlag,
    CascadeError, CascadeOutcome,
};
use crate::model::{
    normalize_label, Block, Folder, Note, UserSpace, DEFAULT_FOLDER_NAME, DEFAULT_NOTE_TITLE,
};
use crate::store::EntityStore;
use crate::tree::{build_navigation_tree, TreeView};

/// A delete that never started (bad id, foreign record) versus one
/// that started and stopped partway, with the partial outcome.
#[derive(Debug, thiserror::Error)]
pub enum DeleteFolderError {
    #[error(transparent)]
    Rejected(#[from] HierarchyError),
    #[error(transparent)]
    Aborted(#[from] CascadeError),
}

pub struct NoteHubService {
    store: Arc<dyn EntityStore>,
}

impl NoteHubService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }

    pub async fn create_folder(
        &self,
        space: &UserSpace,
        name: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Folder> {
        if let Some(parent) = parent_id {
            require_owned_folder(self.store(), parent, space.id).await?;
        }
        let now = Utc::now();
        let folder = Folder {
            id: Uuid::new_v4(),
            user_space_id: space.id,
            name: normalize_label(name, DEFAULT_FOLDER_NAME),
            parent_id,
            created_time: now,
            last_updated_time: now,
        };
        self.store.insert_folder(folder.clone()).await?;
        debug!(folder = %folder.id, space = %space.id, "folder created");
        Ok(folder)
    }

    pub async fn rename_folder(&self, space: &UserSpace, id: Uuid, name: &str) -> Result<Folder> {
        let mut folder = require_owned_folder(self.store(), id, space.id).await?;
        folder.name = normalize_label(name, DEFAULT_FOLDER_NAME);
        folder.last_updated_time = Utc::now();
        self.write_folder(folder).await
    }

    /// Re-parents a folder. `new_parent_id = None` moves it to the
    /// root, which always succeeds for a valid id; otherwise the new
    /// parent must exist, belong to the same space and not be a
    /// descendant of the folder being moved.
    pub async fn move_folder(
        &self,
        space: &UserSpace,
        id: Uuid,
        new_parent_id: Option<Uuid>,
    ) -> Result<Folder> {
        if new_parent_id == Some(id) {
            return Err(HierarchyError::SelfParent {
                kind: EntityKind::Folder,
                id,
            });
        }
        let mut folder = require_owned_folder(self.store(), id, space.id).await?;
        if let Some(parent) = new_parent_id {
            require_owned_folder(self.store(), parent, space.id).await?;
            if is_ancestor(self.store(), id, parent).await? {
                return Err(HierarchyError::CyclicParent {
                    folder: id,
                    new_parent: parent,
                });
            }
        }
        folder.parent_id = new_parent_id;
        folder.last_updated_time = Utc::now();
        let folder = self.write_folder(folder).await?;
        debug!(folder = %id, parent = ?new_parent_id, "folder moved");
        Ok(folder)
    }

    /// Deletes a folder and its whole subtree, leaves first.
    pub async fn delete_folder(
        &self,
        space: &UserSpace,
        id: Uuid,
        cancel: &CancelFlag,
    ) -> std::result::Result<CascadeOutcome, DeleteFolderError> {
        require_owned_folder(self.store(), id, space.id).await?;
        let outcome = cascade_delete_folder(self.store(), id, cancel).await?;
        Ok(outcome)
    }

    pub async fn create_note(
        &self,
        space: &UserSpace,
        title: &str,
        parent_id: Option<Uuid>,
        content: Vec<Block>,
    ) -> Result<Note> {
        if let Some(parent) = parent_id {
            require_owned_folder(self.store(), parent, space.id).await?;
        }
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            user_space_id: space.id,
            title: normalize_label(title, DEFAULT_NOTE_TITLE),
            parent_id,
            content,
            created_time: now,
            last_updated_time: now,
        };
        self.store.insert_note(note.clone()).await?;
        debug!(note = %note.id, space = %space.id, "note created");
        Ok(note)
    }

    pub async fn find_note(&self, space: &UserSpace, id: Uuid) -> Result<Note> {
        require_owned_note(self.store(), id, space.id).await
    }

    pub async fn rename_note(&self, space: &UserSpace, id: Uuid, title: &str) -> Result<Note> {
        let mut note = require_owned_note(self.store(), id, space.id).await?;
        note.title = normalize_label(title, DEFAULT_NOTE_TITLE);
        note.last_updated_time = Utc::now();
        self.write_note(note).await
    }

    /// Overwrites a note's title and block content in one step. Block
    /// structure is validated before this is called (a checkbox block
    /// without `selected` never deserializes).
    pub async fn update_note_content(
        &self,
        space: &UserSpace,
        id: Uuid,
        title: &str,
        content: Vec<Block>,
    ) -> Result<Note> {
        let mut note = require_owned_note(self.store(), id, space.id).await?;
        note.title = normalize_label(title, DEFAULT_NOTE_TITLE);
        note.content = content;
        note.last_updated_time = Utc::now();
        self.write_note(note).await
    }

    /// Re-parents a note. Notes cannot be ancestors of folders, so
    /// only existence and ownership of the target folder are checked.
    pub async fn move_note(
        &self,
        space: &UserSpace,
        id: Uuid,
        new_parent_id: Option<Uuid>,
    ) -> Result<Note> {
        if new_parent_id == Some(id) {
            return Err(HierarchyError::SelfParent {
                kind: EntityKind::Note,
                id,
            });
        }
        let mut note = require_owned_note(self.store(), id, space.id).await?;
        if let Some(parent) = new_parent_id {
            require_owned_folder(self.store(), parent, space.id).await?;
        }
        note.parent_id = new_parent_id;
        note.last_updated_time = Utc::now();
        let note = self.write_note(note).await?;
        debug!(note = %id, parent = ?new_parent_id, "note moved");
        Ok(note)
    }

    pub async fn delete_note(&self, space: &UserSpace, id: Uuid) -> Result<Note> {
        let note = require_owned_note(self.store(), id, space.id).await?;
        self.store.delete_note(id).await?;
        debug!(note = %id, "note deleted");
        Ok(note)
    }

    /// Materializes the navigation tree for the whole space.
    pub async fn space_content(&self, space: &UserSpace) -> Result<TreeView> {
        let folders = self.store.folders_in_space(space.id).await?;
        let notes = self.store.notes_in_space(space.id).await?;
        build_navigation_tree(folders, notes)
    }

    /// Deletes the space together with everything it owns. Root
    /// folders cascade leaves-first; whatever remains afterwards
    /// (root notes, or records corrupt enough to be unreachable) is
    /// swept flat before the space record itself goes.
    pub async fn delete_space(
        &self,
        space: &UserSpace,
        cancel: &CancelFlag,
    ) -> std::result::Result<CascadeOutcome, DeleteFolderError> {
        let mut outcome = CascadeOutcome::default();
        let folders = self
            .store
            .folders_in_space(space.id)
            .await
            .map_err(HierarchyError::from)?;
        for root in folders.iter().filter(|f| f.parent_id.is_none()) {
            let partial = cascade_delete_folder(self.store(), root.id, cancel).await;
            match partial {
                Ok(done) => {
                    outcome.deleted_folder_ids.extend(done.deleted_folder_ids);
                    outcome.deleted_note_ids.extend(done.deleted_note_ids);
                }
                Err(mut err) => {
                    err.partial
                        .deleted_folder_ids
                        .splice(0..0, outcome.deleted_folder_ids);
                    err.partial
                        .deleted_note_ids
                        .splice(0..0, outcome.deleted_note_ids);
                    return Err(err.into());
                }
            }
        }
        for folder in self
            .store
            .folders_in_space(space.id)
            .await
            .map_err(HierarchyError::from)?
        {
            if self
                .store
                .delete_folder(folder.id)
                .await
                .map_err(HierarchyError::from)?
            {
                outcome.deleted_folder_ids.push(folder.id);
            }
        }
        for note in self
            .store
            .notes_in_space(space.id)
            .await
            .map_err(HierarchyError::from)?
        {
            if self
                .store
                .delete_note(note.id)
                .await
                .map_err(HierarchyError::from)?
            {
                outcome.deleted_note_ids.push(note.id);
            }
        }
        self.store
            .delete_user_space(space.id)
            .await
            .map_err(HierarchyError::from)?;
        debug!(space = %space.id, "user space deleted");
        Ok(outcome)
    }

    async fn write_folder(&self, folder: Folder) -> Result<Folder> {
        if !self.store.update_folder(folder.clone()).await? {
            return Err(HierarchyError::NotFound {
                kind: EntityKind::Folder,
                id: folder.id,
            });
        }
        Ok(folder)
    }

    async fn write_note(&self, note: Note) -> Result<Note> {
        if !self.store.update_note(note.clone()).await? {
            return Err(HierarchyError::NotFound {
                kind: EntityKind::Note,
                id: note.id,
            });
        }
        Ok(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::tenant::resolve_tenant;

    async fn service() -> (NoteHubService, UserSpace) {
        let store = Arc::new(MemoryStore::new());
        let space = resolve_tenant(store.as_ref(), "auth0|alice").await.unwrap();
        (NoteHubService::new(store), space)
    }

    #[tokio::test]
    async fn create_root_folder_has_no_parent() {
        let (svc, space) = service().await;
        let a = svc.create_folder(&space, "A", None).await.unwrap();
        assert_eq!(a.parent_id, None);
        assert_eq!(a.name, "A");
        assert_eq!(a.user_space_id, space.id);
    }

    #[tokio::test]
    async fn nested_create_then_cyclic_move_is_rejected() {
        let (svc, space) = service().await;
        let a = svc.create_folder(&space, "A", None).await.unwrap();
        let b = svc.create_folder(&space, "B", Some(a.id)).await.unwrap();
        let n = svc
            .create_note(&space, "N", Some(b.id), Vec::new())
            .await
            .unwrap();
        assert_eq!(n.parent_id, Some(b.id));

        match svc.move_folder(&space, a.id, Some(b.id)).await {
            Err(HierarchyError::CyclicParent { folder, new_parent }) => {
                assert_eq!(folder, a.id);
                assert_eq!(new_parent, b.id);
            }
            other => panic!("expected cyclic parent, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn self_parent_move_is_rejected_for_folders_and_notes() {
        let (svc, space) = service().await;
        let a = svc.create_folder(&space, "A", None).await.unwrap();
        assert!(matches!(
            svc.move_folder(&space, a.id, Some(a.id)).await,
            Err(HierarchyError::SelfParent { .. })
        ));
        let n = svc.create_note(&space, "n", None, Vec::new()).await.unwrap();
        assert!(matches!(
            svc.move_note(&space, n.id, Some(n.id)).await,
            Err(HierarchyError::SelfParent { .. })
        ));
    }

    #[tokio::test]
    async fn move_to_root_always_succeeds_for_a_valid_id() {
        let (svc, space) = service().await;
        let a = svc.create_folder(&space, "A", None).await.unwrap();
        let b = svc.create_folder(&space, "B", Some(a.id)).await.unwrap();
        let moved = svc.move_folder(&space, b.id, None).await.unwrap();
        assert_eq!(moved.parent_id, None);
    }

    #[tokio::test]
    async fn delete_folder_cascades_to_descendants() {
        let (svc, space) = service().await;
        let a = svc.create_folder(&space, "A", None).await.unwrap();
        let b = svc.create_folder(&space, "B", Some(a.id)).await.unwrap();
        let n = svc
            .create_note(&space, "N", Some(b.id), Vec::new())
            .await
            .unwrap();

        let outcome = svc
            .delete_folder(&space, a.id, &CancelFlag::new())
            .await
            .unwrap();
        assert_eq!(outcome.deleted_folder_ids.len(), 2);
        assert_eq!(outcome.deleted_note_ids, vec![n.id]);

        assert!(svc.store().folder(b.id).await.unwrap().is_none());
        assert!(matches!(
            svc.find_note(&space, n.id).await,
            Err(HierarchyError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn empty_names_are_stored_as_placeholders() {
        let (svc, space) = service().await;
        let f = svc.create_folder(&space, "", None).await.unwrap();
        assert_eq!(f.name, DEFAULT_FOLDER_NAME);

        let renamed = svc.rename_folder(&space, f.id, "   ").await.unwrap();
        assert_eq!(renamed.name, DEFAULT_FOLDER_NAME);

        let n = svc.create_note(&space, "", None, Vec::new()).await.unwrap();
        assert_eq!(n.title, DEFAULT_NOTE_TITLE);
        let renamed = svc.rename_note(&space, n.id, "").await.unwrap();
        assert_eq!(renamed.title, DEFAULT_NOTE_TITLE);
    }

    #[tokio::test]
    async fn foreign_records_are_not_accessible() {
        let store = Arc::new(MemoryStore::new());
        let alice = resolve_tenant(store.as_ref(), "auth0|alice").await.unwrap();
        let bob = resolve_tenant(store.as_ref(), "auth0|bob").await.unwrap();
        let svc = NoteHubService::new(store);

        let theirs = svc.create_folder(&bob, "private", None).await.unwrap();
        assert!(matches!(
            svc.rename_folder(&alice, theirs.id, "mine now").await,
            Err(HierarchyError::OwnershipViolation { .. })
        ));
        assert!(matches!(
            svc.create_folder(&alice, "sub", Some(theirs.id)).await,
            Err(HierarchyError::OwnershipViolation { .. })
        ));
        assert!(matches!(
            svc.delete_folder(&alice, theirs.id, &CancelFlag::new())
                .await,
            Err(DeleteFolderError::Rejected(
                HierarchyError::OwnershipViolation { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn update_note_content_overwrites_blocks() {
        let (svc, space) = service().await;
        let n = svc
            .create_note(&space, "todo", None, Vec::new())
            .await
            .unwrap();
        let blocks: Vec<Block> = serde_json::from_value(serde_json::json!([
            { "type": "text", "content": "first" },
            { "type": "checkbox", "content": "done?", "uniqueProperties": { "selected": false } }
        ]))
        .unwrap();
        let updated = svc
            .update_note_content(&space, n.id, "todo v2", blocks.clone())
            .await
            .unwrap();
        assert_eq!(updated.title, "todo v2");
        assert_eq!(updated.content, blocks);
        assert!(updated.last_updated_time >= n.last_updated_time);
    }

    #[tokio::test]
    async fn space_content_returns_the_nested_view() {
        let (svc, space) = service().await;
        let a = svc.create_folder(&space, "A", None).await.unwrap();
        let b = svc.create_folder(&space, "B", Some(a.id)).await.unwrap();
        let n = svc
            .create_note(&space, "N", Some(b.id), Vec::new())
            .await
            .unwrap();

        let view = svc.space_content(&space).await.unwrap();
        assert_eq!(view.tree.folders.len(), 1);
        assert_eq!(view.tree.folders[0].folder.id, a.id);
        assert_eq!(view.tree.folders[0].item_count, 1);
        assert_eq!(view.tree.folders[0].folders[0].item_count, 1);
        assert_eq!(view.parent_lookup[&n.id], Some(b.id));
    }

    #[tokio::test]
    async fn delete_space_removes_all_owned_content() {
        let store = Arc::new(MemoryStore::new());
        let alice = resolve_tenant(store.as_ref(), "auth0|alice").await.unwrap();
        let bob = resolve_tenant(store.as_ref(), "auth0|bob").await.unwrap();
        let svc = NoteHubService::new(store.clone());

        let a = svc.create_folder(&alice, "A", None).await.unwrap();
        svc.create_folder(&alice, "B", Some(a.id)).await.unwrap();
        svc.create_note(&alice, "loose", None, Vec::new()).await.unwrap();
        let kept = svc.create_folder(&bob, "keep", None).await.unwrap();

        let outcome = svc.delete_space(&alice, &CancelFlag::new()).await.unwrap();
        assert_eq!(outcome.deleted_folder_ids.len(), 2);
        assert_eq!(outcome.deleted_note_ids.len(), 1);

        assert!(store.folders_in_space(alice.id).await.unwrap().is_empty());
        assert!(store.notes_in_space(alice.id).await.unwrap().is_empty());
        assert!(store.user_space(alice.id).await.unwrap().is_none());
        assert!(store.folder(kept.id).await.unwrap().is_some());
    }
}
