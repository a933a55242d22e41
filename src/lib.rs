pub mod capture;
pub mod cli;
pub mod config;
pub mod diff;
pub mod playback;
pub mod recording;
pub mod state;
pub mod util;

pub use capture::{Recorder, RecorderError, RecordingOutput};
pub use config::Config;
pub use diff::{apply_patch, derive_operations, EditOperation, PatchError};
pub use playback::{
    compile, BufferSurface, Driver, EditorSurface, Instruction, Pacing, PlaybackTiming, Player,
    PlayerError,
};
pub use recording::{PlaybackMode, Recording, RecordingError, Step};
pub use state::{Persistent, StateStore};
