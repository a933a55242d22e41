//! Workspace-scoped persistence for the player and recorder.

pub mod store;

pub use store::{workspace_hash, LoadMiss, Persistent, StateError, StateStore};
