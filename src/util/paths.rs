//! Where live-demo keeps its config, logs and session state.

use std::path::PathBuf;
use std::sync::OnceLock;

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Pin the data directory for the rest of the process. `None` keeps
/// `~/.live-demo`. Only the first call has any effect.
pub fn init_data_dir(custom_path: Option<PathBuf>) {
    let path = custom_path.unwrap_or_else(default_data_dir);
    if let Err(rejected) = DATA_DIR.set(path) {
        tracing::debug!(
            path = %rejected.display(),
            "data directory already pinned, ignoring"
        );
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".live-demo"))
        .unwrap_or_else(|| PathBuf::from(".live-demo"))
}

pub fn data_dir() -> PathBuf {
    DATA_DIR.get().cloned().unwrap_or_else(default_data_dir)
}

pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

pub fn log_file_path() -> PathBuf {
    logs_dir().join("live-demo.log")
}

/// Default home of the state store, one file per workspace and session kind.
pub fn state_dir() -> PathBuf {
    data_dir().join("state")
}

pub fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}
