//! HTTP server for the note-hub organizer: routing, auth extraction
//! and error mapping over `note-hub-core`.

pub mod api;
pub mod auth;
