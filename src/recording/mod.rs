//! Recordings: ordered steps, each describing how one file changes.

pub mod document;
pub mod error;
pub mod model;

pub use document::{parse, read_from_path, serialize, write_to_path, RECORDING_NAMESPACE};
pub use error::RecordingError;
pub use model::{PlaybackMode, Recording, Step};
