//! Integration tests for live-demo
//!
//! These tests drive recording, playback and the CLI end to end against
//! temporary workspaces.

#[path = "../common/mod.rs"]
pub mod common;

pub mod cli_flow;
pub mod playback_flow;
