//! Shared test utilities for live-demo
//!
//! Provides temporary workspaces with their own state directory and helpers
//! for building recordings from before/after text pairs.

pub mod workspace;
