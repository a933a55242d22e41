//! Recording: snapshot a file, let the author edit it, turn the difference
//! into a step.

pub mod error;
pub mod recorder;

pub use error::RecorderError;
pub use recorder::{Capture, Recorder, RecorderPhase, RecorderState, RecordingOutput};
