use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How inserted text reaches the editor during playback.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackMode {
    /// One insert per character.
    #[default]
    Type,
    /// The whole replacement in a single insert.
    Paste,
}

impl PlaybackMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackMode::Type => "TYPE",
            PlaybackMode::Paste => "PASTE",
        }
    }
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaybackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TYPE" => Ok(PlaybackMode::Type),
            "PASTE" => Ok(PlaybackMode::Paste),
            other => Err(format!("unknown playback mode '{other}'")),
        }
    }
}

/// One recorded change to a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Path relative to the workspace root.
    pub target_file: String,
    pub playback_mode: PlaybackMode,
    /// Truncate the file before playing the step instead of reading it.
    pub start_empty: bool,
    /// Unified diff from the file's content before the step to after it.
    pub patch: String,
}

impl Step {
    /// Build a step. Surrounding whitespace is stripped from `target_file`,
    /// as the document format does on load.
    pub fn new(
        target_file: impl Into<String>,
        patch: impl Into<String>,
        playback_mode: PlaybackMode,
        start_empty: bool,
    ) -> Self {
        let mut target_file = target_file.into();
        if target_file.trim().len() != target_file.len() {
            target_file = target_file.trim().to_string();
        }
        Self {
            target_file,
            playback_mode,
            start_empty,
            patch: patch.into(),
        }
    }
}

/// An ordered list of steps. Playback follows the order strictly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    steps: Vec<Step>,
}

impl Recording {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Append a step. The patch is not checked against any file here.
    pub fn add_step(
        &mut self,
        target_file: impl Into<String>,
        patch: impl Into<String>,
        playback_mode: PlaybackMode,
        start_empty: bool,
    ) -> &Step {
        self.steps
            .push(Step::new(target_file, patch, playback_mode, start_empty));
        &self.steps[self.steps.len() - 1]
    }
}
