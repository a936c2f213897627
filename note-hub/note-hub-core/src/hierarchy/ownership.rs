//! Tenant isolation at the record level.
//!
//! Any id supplied by a caller (path parameter or body field) passes
//! through one of these guards before the operation may touch the
//! record. A record that belongs to another user space surfaces as
//! [`HierarchyError::OwnershipViolation`]; handlers are free to
//! collapse that with `NotFound` so existence never leaks across
//! tenants.

use uuid::Uuid;

use crate::error::{EntityKind, HierarchyError, Result};
use crate::model::{Folder, Note};
use crate::store::EntityStore;

/// Returns true only if the folder exists and is owned by the space.
pub async fn folder_belongs_to_space(
    store: &dyn EntityStore,
    id: Uuid,
    user_space_id: Uuid,
) -> Result<bool> {
    Ok(store
        .folder(id)
        .await?
        .is_some_and(|f| f.user_space_id == user_space_id))
}

/// Returns true only if the note exists and is owned by the space.
pub async fn note_belongs_to_space(
    store: &dyn EntityStore,
    id: Uuid,
    user_space_id: Uuid,
) -> Result<bool> {
    Ok(store
        .note(id)
        .await?
        .is_some_and(|n| n.user_space_id == user_space_id))
}

/// Fetches a folder, rejecting ids that resolve to nothing or to a
/// record owned by another user space.
pub async fn require_owned_folder(
    store: &dyn EntityStore,
    id: Uuid,
    user_space_id: Uuid,
) -> Result<Folder> {
    let folder = store.folder(id).await?.ok_or(HierarchyError::NotFound {
        kind: EntityKind::Folder,
        id,
    })?;
    if folder.user_space_id != user_space_id {
        return Err(HierarchyError::OwnershipViolation {
            kind: EntityKind::Folder,
            id,
        });
    }
    Ok(folder)
}

/// Fetches a note, rejecting ids that resolve to nothing or to a
/// record owned by another user space.
pub async fn require_owned_note(
    store: &dyn EntityStore,
    id: Uuid,
    user_space_id: Uuid,
) -> Result<Note> {
    let note = store.note(id).await?.ok_or(HierarchyError::NotFound {
        kind: EntityKind::Note,
        id,
    })?;
    if note.user_space_id != user_space_id {
        return Err(HierarchyError::OwnershipViolation {
            kind: EntityKind::Note,
            id,
        });
    }
    Ok(note)
}
