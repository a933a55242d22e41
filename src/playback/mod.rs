//! Playback: compile steps into timed editing instructions and feed them to
//! an editor one at a time, persisting progress after each.

pub mod compiler;
pub mod driver;
pub mod error;
pub mod instruction;
pub mod player;
pub mod surface;

pub use compiler::{compile, CompiledStep, PlaybackTiming};
pub use driver::{progress_bar, Driver, Pacing, Tick};
pub use error::{DriverError, PlayerError};
pub use instruction::{Action, Instruction};
pub use player::{PlaybackState, Player, PlayerPhase};
pub use surface::{BufferSurface, DocumentId, EditorSurface, SurfaceError};
