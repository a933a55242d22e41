use std::path::PathBuf;

/// Errors raised while loading or storing a recording document.
#[derive(Debug, thiserror::Error)]
pub enum RecordingError {
    /// A step is missing a required field or carries an unusable value.
    #[error("malformed recording: step {step}: {reason}")]
    Malformed { step: usize, reason: String },

    /// The document itself is not a recording.
    #[error("malformed recording: {0}")]
    Document(String),

    /// The document is not valid JSON.
    #[error("recording is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing the recording file failed.
    #[error("recording file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RecordingError {
    pub(crate) fn malformed(step: usize, reason: impl Into<String>) -> Self {
        RecordingError::Malformed {
            step,
            reason: reason.into(),
        }
    }
}
