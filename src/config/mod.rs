mod settings;

pub use settings::{Config, PlaybackConfig, EXAMPLE_CONFIG};
