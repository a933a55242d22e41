//! Recording documents.
//!
//! A recording is stored as pretty-printed JSON with a fixed field order so
//! that recordings diff cleanly under version control:
//!
//! ```json
//! {
//!   "namespace": "urn:live-demo:recording",
//!   "steps": [
//!     { "filename": "src/main.rs", "method": "TYPE", "empty": false, "diff": "--- original\n..." }
//!   ]
//! }
//! ```
//!
//! Parsing is lenient where hand-edited documents tend to vary: `method` is
//! case-insensitive and defaults to `TYPE`, `empty` accepts booleans, `0`/`1`
//! and the strings `true`/`false`/`1`/`0`/`yes`/`no`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diff::parse_patch;

use super::error::RecordingError;
use super::model::{PlaybackMode, Recording, Step};

pub const RECORDING_NAMESPACE: &str = "urn:live-demo:recording";

#[derive(Debug, Deserialize)]
struct RawDocument {
    namespace: Option<String>,
    #[serde(default)]
    steps: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    filename: Option<String>,
    method: Option<String>,
    empty: Option<Flag>,
    diff: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl Flag {
    fn to_bool(&self) -> Option<bool> {
        match self {
            Flag::Bool(value) => Some(*value),
            Flag::Number(1) => Some(true),
            Flag::Number(0) => Some(false),
            Flag::Number(_) => None,
            Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct DocumentOut<'a> {
    namespace: &'static str,
    steps: Vec<StepOut<'a>>,
}

#[derive(Debug, Serialize)]
struct StepOut<'a> {
    filename: &'a str,
    method: PlaybackMode,
    empty: bool,
    diff: &'a str,
}

/// Parse a recording document.
pub fn parse(document: &str) -> Result<Recording, RecordingError> {
    let raw: RawDocument = serde_json::from_str(document)?;

    if let Some(namespace) = raw.namespace.as_deref() {
        if namespace != RECORDING_NAMESPACE {
            return Err(RecordingError::Document(format!(
                "unexpected namespace '{namespace}' (expected '{RECORDING_NAMESPACE}')"
            )));
        }
    }

    let steps = raw
        .steps
        .into_iter()
        .enumerate()
        .map(|(index, step)| parse_step(index + 1, step))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Recording::from_steps(steps))
}

fn parse_step(index: usize, raw: RawStep) -> Result<Step, RecordingError> {
    let filename = raw
        .filename
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| RecordingError::malformed(index, "missing filename"))?
        .to_string();

    let diff = raw
        .diff
        .ok_or_else(|| RecordingError::malformed(index, "missing diff"))?;
    parse_patch(&diff).map_err(|e| RecordingError::malformed(index, e.to_string()))?;

    let playback_mode = match raw.method.as_deref() {
        None => PlaybackMode::default(),
        Some(method) => method
            .parse()
            .map_err(|reason: String| RecordingError::malformed(index, reason))?,
    };

    let start_empty = match raw.empty {
        None => false,
        Some(flag) => flag.to_bool().ok_or_else(|| {
            RecordingError::malformed(index, format!("invalid empty flag {flag:?}"))
        })?,
    };

    Ok(Step {
        target_file: filename,
        playback_mode,
        start_empty,
        patch: diff,
    })
}

/// Serialize a recording to its document form.
pub fn serialize(recording: &Recording) -> Result<String, RecordingError> {
    let document = DocumentOut {
        namespace: RECORDING_NAMESPACE,
        steps: recording
            .steps()
            .iter()
            .map(|step| StepOut {
                filename: &step.target_file,
                method: step.playback_mode,
                empty: step.start_empty,
                diff: &step.patch,
            })
            .collect(),
    };
    let mut out = serde_json::to_string_pretty(&document)?;
    out.push('\n');
    Ok(out)
}

pub fn read_from_path(path: &Path) -> Result<Recording, RecordingError> {
    let contents = fs::read_to_string(path).map_err(|source| RecordingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents)
}

pub fn write_to_path(recording: &Recording, path: &Path) -> Result<(), RecordingError> {
    let contents = serialize(recording)?;
    fs::write(path, contents).map_err(|source| RecordingError::Io {
        path: path.to_path_buf(),
        source,
    })
}
