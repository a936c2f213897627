//! Recursive folder deletion, flattened into an explicit stack.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::HierarchyError;
use crate::store::EntityStore;

/// Cooperative cancellation signal for a running cascade. Cloned
/// handles share the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Ids actually removed by a cascade, complete on success and partial
/// on abort so callers can decide on cleanup or retry.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeOutcome {
    pub deleted_folder_ids: Vec<Uuid>,
    pub deleted_note_ids: Vec<Uuid>,
}

#[derive(Debug, thiserror::Error)]
pub enum CascadeAbort {
    #[error("cancelled")]
    Cancelled,
    #[error(transparent)]
    Failed(#[from] HierarchyError),
}

/// A cascade that stopped early. `partial` lists what was removed
/// before the abort; because folders are only removed after their
/// whole subtree, nothing left behind points at a deleted parent.
#[derive(Debug, thiserror::Error)]
#[error(
    "cascade delete aborted ({reason}) after removing {} folders and {} notes",
    partial.deleted_folder_ids.len(),
    partial.deleted_note_ids.len()
)]
pub struct CascadeError {
    pub partial: CascadeOutcome,
    pub reason: CascadeAbort,
}

enum Visit {
    Enter(Uuid),
    Remove(Uuid),
}

/// Deletes `folder_id` together with every folder and note whose
/// parent chain leads to it.
///
/// The traversal is post-order: a folder's child folders are fully
/// removed (recursively) and its child notes deleted before the
/// folder itself, so an interruption partway never orphans children
/// under a missing parent. Depth is data-driven, so the recursion is
/// expressed as an explicit stack with a visited guard; a folder seen
/// twice means the stored tree is corrupt and aborts the cascade.
pub async fn cascade_delete_folder(
    store: &dyn EntityStore,
    folder_id: Uuid,
    cancel: &CancelFlag,
) -> Result<CascadeOutcome, CascadeError> {
    let mut outcome = CascadeOutcome::default();
    let mut visited = HashSet::new();
    let mut stack = vec![Visit::Enter(folder_id)];

    while let Some(visit) = stack.pop() {
        if cancel.is_cancelled() {
            return Err(CascadeError {
                partial: outcome,
                reason: CascadeAbort::Cancelled,
            });
        }
        match visit {
            Visit::Enter(id) => {
                if !visited.insert(id) {
                    error!(folder = %id, "folder subtree loops back on itself");
                    return Err(CascadeError {
                        partial: outcome,
                        reason: CascadeAbort::Failed(HierarchyError::DanglingReference {
                            id,
                            parent: id,
                        }),
                    });
                }
                stack.push(Visit::Remove(id));
                let children = match store.child_folders(id).await {
                    Ok(children) => children,
                    Err(err) => {
                        return Err(CascadeError {
                            partial: outcome,
                            reason: CascadeAbort::Failed(err.into()),
                        })
                    }
                };
                for child in children {
                    stack.push(Visit::Enter(child.id));
                }
            }
            Visit::Remove(id) => {
                if let Err(err) = remove_folder(store, id, &mut outcome).await {
                    return Err(CascadeError {
                        partial: outcome,
                        reason: CascadeAbort::Failed(err),
                    });
                }
            }
        }
    }

    debug!(
        folder = %folder_id,
        folders = outcome.deleted_folder_ids.len(),
        notes = outcome.deleted_note_ids.len(),
        "cascade delete finished"
    );
    Ok(outcome)
}

/// Deletes one folder's direct notes, then the folder itself. Only
/// called once the folder's child folders are gone.
async fn remove_folder(
    store: &dyn EntityStore,
    id: Uuid,
    outcome: &mut CascadeOutcome,
) -> Result<(), HierarchyError> {
    for note in store.child_notes(id).await? {
        if store.delete_note(note.id).await? {
            outcome.deleted_note_ids.push(note.id);
        }
    }
    if store.delete_folder(id).await? {
        outcome.deleted_folder_ids.push(id);
    }
    Ok(())
}
