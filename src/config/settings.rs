use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::playback::{Pacing, PlaybackTiming};
use crate::state::StateStore;
use crate::util::paths::{config_path, state_dir};

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Playback pacing
    pub playback: PlaybackConfig,
    /// Directory for persisted player/recorder state
    pub state_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackConfig {
    pub timing: PlaybackTiming,
    pub pacing: Pacing,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TomlConfig {
    playback: Option<TomlPlaybackConfig>,
    state: Option<TomlStateConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TomlPlaybackConfig {
    base_delay_ms: Option<u64>,
    extend_delay_ms: Option<u64>,
    hold_delay_ms: Option<u64>,
    jitter: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TomlStateConfig {
    dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            state_dir: state_dir(),
        }
    }
}

impl Config {
    /// Load configuration from file, merging with defaults
    pub fn load() -> Self {
        let config_file = config_path();

        // Create example config on first run
        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        match fs::read_to_string(&config_file) {
            Ok(contents) => Self::from_toml_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %config_file.display(),
                    error = %e,
                    "Invalid config file, using defaults"
                );
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    /// Parse configuration text, merging it over defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        let toml_config = toml::from_str::<TomlConfig>(contents)?;
        let mut config = Config::default();

        if let Some(playback) = toml_config.playback {
            let timing = &mut config.playback.timing;
            if let Some(base) = playback.base_delay_ms {
                timing.base_delay_ms = base;
            }
            if let Some(extend) = playback.extend_delay_ms {
                timing.extend_delay_ms = extend;
            }
            if let Some(hold) = playback.hold_delay_ms {
                timing.hold_delay_ms = hold;
            }
            if let Some(jitter) = playback.jitter {
                config.playback.pacing = if jitter {
                    Pacing::Jittered
                } else {
                    Pacing::Fixed
                };
            }
        }

        if let Some(dir) = toml_config.state.and_then(|state| state.dir) {
            config.state_dir = dir;
        }

        Ok(config)
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!(error = %e, "Failed to create config directory");
                return;
            }
        }

        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::warn!(error = %e, "Failed to write default config");
        }
    }

    pub fn state_store(&self) -> StateStore {
        StateStore::new(self.state_dir.clone())
    }
}
