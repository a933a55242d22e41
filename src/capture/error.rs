use std::path::PathBuf;

use crate::playback::{DocumentId, SurfaceError};
use crate::recording::RecordingError;
use crate::state::StateError;

#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    /// The captured file is unchanged; the capture stays open.
    #[error("no changes found in {file}")]
    NoChangesDetected { file: String },

    #[error("already recording a step for {file}")]
    CaptureInProgress { file: String },

    #[error("no step is being recorded")]
    NoCaptureInProgress,

    #[error("{path} is outside the workspace")]
    OutsideWorkspace { path: PathBuf },

    /// Steps for a document output arrived without the editor holding it.
    #[error("recording document {id} is not available")]
    DocumentUnavailable { id: DocumentId },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Recording(#[from] RecordingError),

    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error(transparent)]
    State(#[from] StateError),
}

impl RecorderError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| RecorderError::Io { path, source }
    }
}
