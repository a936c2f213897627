//! Persisted record shapes: user spaces, folders, notes and note blocks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HierarchyError;

/// Placeholder stored when a folder is created or renamed with an
/// empty name.
pub const DEFAULT_FOLDER_NAME: &str = "Untitled folder";
/// Placeholder stored when a note is created or renamed with an empty
/// title.
pub const DEFAULT_NOTE_TITLE: &str = "Untitled note";

/// Ownership root for one tenant. Created lazily on first content
/// access; every folder and note points back at it through
/// `user_space_id`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSpace {
    pub id: Uuid,
    /// Stable external identity (the auth subject), unique per space.
    pub tenant_key: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: Uuid,
    pub user_space_id: Uuid,
    pub name: String,
    /// Optional parent folder in the same user space.
    pub parent_id: Option<Uuid>,
    pub created_time: DateTime<Utc>,
    pub last_updated_time: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub user_space_id: Uuid,
    pub title: String,
    /// Optional parent folder in the same user space.
    pub parent_id: Option<Uuid>,
    pub content: Vec<Block>,
    pub created_time: DateTime<Utc>,
    pub last_updated_time: DateTime<Utc>,
}

/// One unit of note content.
///
/// The variant payload is keyed by the block `type`, so a `checkbox`
/// block without its `selected` property fails deserialization and is
/// rejected before anything is written.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub kind: BlockKind,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BlockKind {
    Text,
    Heading,
    Checkbox {
        #[serde(rename = "uniqueProperties")]
        unique_properties: CheckboxProperties,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckboxProperties {
    pub selected: bool,
}

/// Trims the input and substitutes `fallback` when nothing is left,
/// so names and titles are never stored empty.
pub fn normalize_label(input: &str, fallback: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parses a caller-supplied id, mapping malformed input to
/// [`HierarchyError::InvalidIdentifier`].
pub fn parse_id(raw: &str) -> Result<Uuid, HierarchyError> {
    Uuid::parse_str(raw).map_err(|_| HierarchyError::InvalidIdentifier(raw.to_string()))
}
