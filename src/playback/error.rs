use std::path::PathBuf;

use crate::diff::PatchError;
use crate::state::StateError;

use super::surface::SurfaceError;

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// Advancing would move past the last step.
    #[error("no step {index} (recording has {total} steps)")]
    NoSuchStep { index: usize, total: usize },

    /// The current step still has instructions queued.
    #[error("step {step} is still playing ({remaining} instructions left)")]
    StepInProgress { step: usize, remaining: usize },

    /// The step's target file could not be read or prepared.
    #[error("cannot prepare {path}: {source}")]
    Target {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The step's patch does not apply to the file's current content.
    #[error("step {step} ({file}): {source}")]
    Patch {
        step: usize,
        file: String,
        #[source]
        source: PatchError,
    },

    #[error(transparent)]
    State(#[from] StateError),
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Player(#[from] PlayerError),

    #[error(transparent)]
    Surface(#[from] SurfaceError),

    /// An edit arrived with no step in progress to name its document.
    #[error("no document to apply the instruction to")]
    NoDocument,
}
