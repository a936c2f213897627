//! Entity store boundary.
//!
//! The hierarchy subsystem never holds state between requests; every
//! read and write goes through [`EntityStore`], which an external
//! document store implements with per-record atomicity only. The
//! in-memory implementation in [`memory`] backs the server and the
//! tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Folder, Note, UserSpace};

pub mod memory;

pub use memory::MemoryStore;

/// Keyed storage for user spaces, folders and notes.
///
/// `update_*` and `delete_*` report whether a matching record existed,
/// so callers can distinguish a no-op from a write.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn user_space(&self, id: Uuid) -> Result<Option<UserSpace>, StoreError>;
    async fn user_space_by_key(&self, tenant_key: &str) -> Result<Option<UserSpace>, StoreError>;
    async fn insert_user_space(&self, space: UserSpace) -> Result<(), StoreError>;
    async fn delete_user_space(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn folder(&self, id: Uuid) -> Result<Option<Folder>, StoreError>;
    /// All folders owned by one user space, in no particular order.
    async fn folders_in_space(&self, user_space_id: Uuid) -> Result<Vec<Folder>, StoreError>;
    /// Direct child folders of `parent_id`.
    async fn child_folders(&self, parent_id: Uuid) -> Result<Vec<Folder>, StoreError>;
    async fn insert_folder(&self, folder: Folder) -> Result<(), StoreError>;
    async fn update_folder(&self, folder: Folder) -> Result<bool, StoreError>;
    async fn delete_folder(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn note(&self, id: Uuid) -> Result<Option<Note>, StoreError>;
    /// All notes owned by one user space, in no particular order.
    async fn notes_in_space(&self, user_space_id: Uuid) -> Result<Vec<Note>, StoreError>;
    /// Direct child notes of `parent_id`.
    async fn child_notes(&self, parent_id: Uuid) -> Result<Vec<Note>, StoreError>;
    async fn insert_note(&self, note: Note) -> Result<(), StoreError>;
    async fn update_note(&self, note: Note) -> Result<bool, StoreError>;
    async fn delete_note(&self, id: Uuid) -> Result<bool, StoreError>;
}
