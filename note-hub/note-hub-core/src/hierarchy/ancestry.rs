//! Cycle prevention for folder moves.

use std::collections::HashSet;

use tracing::error;
use uuid::Uuid;

use crate::error::{HierarchyError, Result};
use crate::store::EntityStore;

/// Reports whether `ancestor` appears on the parent chain of `node`.
///
/// Used before re-parenting: moving folder X under folder P is cyclic
/// exactly when `is_ancestor(X, P)` holds (the self-parent case
/// `X == P` is rejected separately, before this walk runs).
///
/// The walk is iterative, so data-driven depth can never overflow the
/// stack, and it keeps a visited set: revisiting an id means the
/// stored chain already contains a cycle, which is surfaced as a
/// consistency failure rather than looped over. A parent id that
/// resolves to nothing mid-walk is likewise a consistency failure,
/// never "no cycle".
pub async fn is_ancestor(
    store: &dyn EntityStore,
    ancestor: Uuid,
    node: Uuid,
) -> Result<bool> {
    let mut visited = HashSet::new();
    let mut current = node;
    loop {
        if !visited.insert(current) {
            error!(folder = %current, "parent chain loops back on itself");
            return Err(HierarchyError::DanglingReference {
                id: current,
                parent: current,
            });
        }
        let folder = store
            .folder(current)
            .await?
            .ok_or_else(|| {
                error!(folder = %current, "parent chain reaches a missing folder");
                HierarchyError::DanglingReference {
                    id: node,
                    parent: current,
                }
            })?;
        match folder.parent_id {
            None => return Ok(false),
            Some(parent) if parent == ancestor => return Ok(true),
            Some(parent) => current = parent,
        }
    }
}
