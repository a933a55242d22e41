//! Temporary workspace fixtures

use std::fs;
use std::path::PathBuf;

use live_demo::diff::make_patch;
use live_demo::{PlaybackMode, Recording, StateStore, Step};
use tempfile::TempDir;

/// A temporary workspace plus a separate state directory.
///
/// Both directories are removed when the fixture is dropped.
pub struct TestWorkspace {
    _dir: TempDir,
    _state: TempDir,
    /// Path to the workspace root
    pub path: PathBuf,
    /// Store rooted in the fixture's state directory
    pub store: StateStore,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let state = TempDir::new().expect("Failed to create state dir");
        let path = dir.path().to_path_buf();
        let store = StateStore::new(state.path());
        Self {
            _dir: dir,
            _state: state,
            path,
            store,
        }
    }

    pub fn file(&self, relative: &str) -> PathBuf {
        self.path.join(relative)
    }

    /// Write a workspace file, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.file(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.file(relative)).unwrap()
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.file(relative).exists()
    }
}

/// A step turning `before` into `after` in `file`.
pub fn step(file: &str, before: &str, after: &str, mode: PlaybackMode, start_empty: bool) -> Step {
    let patch = make_patch(before, after).expect("texts should differ");
    Step::new(file, patch, mode, start_empty)
}

/// Build a recording from consecutive versions of one file.
pub fn evolution(file: &str, versions: &[&str], mode: PlaybackMode) -> Recording {
    let steps = versions
        .windows(2)
        .map(|pair| step(file, pair[0], pair[1], mode, false))
        .collect();
    Recording::from_steps(steps)
}
