use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use similar::{Algorithm, DiffTag, TextDiff};

use super::apply::{apply_patch, PatchError};

/// Upper bound on the exact re-diff. Past it `similar` falls back to a
/// coarser (still exact) script.
const DIFF_TIMEOUT: Duration = Duration::from_secs(2);

/// One exact edit: replace the characters in `start..end` with `replacement`.
///
/// Offsets count Unicode scalar values and refer to the buffer as it stands
/// when the edit is applied, so operations of one step must be applied in
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOperation {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

impl EditOperation {
    pub fn new(start: usize, end: usize, replacement: impl Into<String>) -> Self {
        Self {
            start,
            end,
            replacement: replacement.into(),
        }
    }

    /// Number of characters removed by this edit.
    pub fn removed(&self) -> usize {
        self.end - self.start
    }
}

/// Result of reconciling a stored patch against concrete text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub final_text: String,
    pub operations: Vec<EditOperation>,
}

/// Apply `patch` to `initial` and derive the exact edits between `initial`
/// and the patched text.
pub fn derive_operations(initial: &str, patch: &str) -> Result<Reconciled, PatchError> {
    let final_text = apply_patch(initial, patch)?;
    let operations = exact_operations(initial, &final_text);
    tracing::debug!(
        operations = operations.len(),
        initial_chars = initial.chars().count(),
        final_chars = final_text.chars().count(),
        "reconciled patch"
    );
    Ok(Reconciled {
        final_text,
        operations,
    })
}

/// Character-level diff of `old` and `new`, collapsed so that every run of
/// inserts and deletes between two unchanged stretches becomes one operation.
fn exact_operations(old: &str, new: &str) -> Vec<EditOperation> {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .deadline(Instant::now() + DIFF_TIMEOUT)
        .diff_chars(old, new);
    let new_chars: Vec<char> = new.chars().collect();

    let mut operations = Vec::new();
    let mut pending: Option<(usize, usize, usize)> = None;
    let mut flush = |pending: &mut Option<(usize, usize, usize)>| {
        if let Some((start, removed, new_end)) = pending.take() {
            operations.push(EditOperation {
                start,
                end: start + removed,
                replacement: new_chars[start..new_end].iter().collect(),
            });
        }
    };

    for op in diff.ops() {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            flush(&mut pending);
            continue;
        }
        pending = Some(match pending {
            Some((start, removed, _)) => (start, removed + old_range.len(), new_range.end),
            None => (new_range.start, old_range.len(), new_range.end),
        });
    }
    flush(&mut pending);

    operations
}

/// Apply `operations` in order to `text`.
///
/// # Panics
///
/// Panics if an operation's range lies outside the text it is applied to.
pub fn apply_operations(text: &str, operations: &[EditOperation]) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    for op in operations {
        chars.splice(op.start..op.end, op.replacement.chars());
    }
    chars.into_iter().collect()
}
