//! Hierarchy integrity and materialization core for the note-hub server.

pub mod error;
pub mod hierarchy;
pub mod model;
pub mod service;
pub mod store;
pub mod tenant;
pub mod tree;
