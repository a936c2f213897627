//! Typed failures for the hierarchy subsystem.

use std::fmt;

use uuid::Uuid;

/// The kind of record an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Folder,
    Note,
    UserSpace,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Folder => write!(f, "folder"),
            EntityKind::Note => write!(f, "note"),
            EntityKind::UserSpace => write!(f, "user space"),
        }
    }
}

/// Failure raised by an [`EntityStore`](crate::store::EntityStore) backend.
#[derive(Debug, thiserror::Error)]
#[error("store failure: {0}")]
pub struct StoreError(#[from] pub anyhow::Error);

impl StoreError {
    pub fn message(msg: impl Into<String>) -> Self {
        Self(anyhow::anyhow!(msg.into()))
    }
}

/// Everything that can go wrong while validating or mutating the
/// folder/note hierarchy.
///
/// `InvalidIdentifier`, `NotFound`, `OwnershipViolation`, `SelfParent`
/// and `CyclicParent` are caller-correctable; `DanglingReference`
/// means the stored data already violates an invariant and `Store` is
/// an I/O-level failure.
#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    #[error("wrong format for id '{0}'")]
    InvalidIdentifier(String),

    #[error("{kind} with id '{id}' not found")]
    NotFound { kind: EntityKind, id: Uuid },

    #[error("this {kind} cannot be accessed by this user")]
    OwnershipViolation { kind: EntityKind, id: Uuid },

    #[error("a {kind} cannot be its own parent")]
    SelfParent { kind: EntityKind, id: Uuid },

    #[error("folder '{folder}' is an ancestor of '{new_parent}', so it cannot be moved there")]
    CyclicParent { folder: Uuid, new_parent: Uuid },

    #[error("stored parent reference '{parent}' of '{id}' cannot be resolved")]
    DanglingReference { id: Uuid, parent: Uuid },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T, E = HierarchyError> = std::result::Result<T, E>;
