//! Patch reconciliation.
//!
//! Stored patches are unified diffs that may have been computed against a
//! slightly different version of a file. Playback needs exact,
//! position-precise edits, so a patch is first applied with tolerance for
//! drift ([`apply`]) and the result is then re-diffed against the literal
//! initial text ([`reconcile`]).

pub mod apply;
pub mod reconcile;

pub use apply::{apply_patch, make_patch, parse_patch, PatchError};
pub use reconcile::{apply_operations, derive_operations, EditOperation, Reconciled};
