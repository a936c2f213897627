//! Hierarchy integrity checks: ownership, ancestry and cascade
//! deletion over the flat parent/child records in the entity store.

pub mod ancestry;
pub mod cascade;
pub mod ownership;

pub use ancestry::is_ancestor;
pub use cascade::{cascade_delete_folder, CancelFlag, CascadeAbort, CascadeError, CascadeOutcome};
pub use ownership::{require_owned_folder, require_owned_note};
