use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::diff::make_patch;
use crate::playback::{DocumentId, EditorSurface};
use crate::recording::{self, PlaybackMode, Recording, Step};
use crate::state::{Persistent, StateStore};

use super::error::RecorderError;

/// Where recorded steps are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordingOutput {
    /// A recording file, rewritten after every step.
    File { path: PathBuf },
    /// An unsaved editor document; the host refreshes it from
    /// [`Recorder::export`].
    Document { id: DocumentId },
}

/// A step being recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    /// Workspace-relative path of the file being edited.
    pub file: String,
    /// Copy of the file taken before editing began.
    pub snapshot: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecorderState {
    pub recording: Recording,
    pub output: RecordingOutput,
    pub capture: Option<Capture>,
    pub workspace_root: PathBuf,
}

impl Persistent for RecorderState {
    const STATE_KEY: &'static str = "live-demo-recording";
    const VERSION: u32 = 1;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderPhase {
    Idle,
    Capturing,
}

/// Records steps into a recording, persisting after every transition.
#[derive(Debug)]
pub struct Recorder {
    state: RecorderState,
    store: StateStore,
}

impl Recorder {
    /// Record into the file at `path`, appending to it if it already holds a
    /// recording.
    pub fn for_file(
        path: impl Into<PathBuf>,
        workspace_root: impl Into<PathBuf>,
        store: StateStore,
    ) -> Result<Self, RecorderError> {
        let path = path.into();
        let recording = if path.exists() {
            recording::read_from_path(&path)?
        } else {
            Recording::new()
        };
        Self::start(
            recording,
            RecordingOutput::File { path },
            workspace_root,
            store,
            None,
        )
    }

    /// Record into the editor document `id`, which is rewritten with the
    /// whole recording after every step.
    pub fn for_document(
        id: DocumentId,
        workspace_root: impl Into<PathBuf>,
        store: StateStore,
        surface: &mut dyn EditorSurface,
    ) -> Result<Self, RecorderError> {
        Self::start(
            Recording::new(),
            RecordingOutput::Document { id },
            workspace_root,
            store,
            Some(surface),
        )
    }

    fn start(
        recording: Recording,
        output: RecordingOutput,
        workspace_root: impl Into<PathBuf>,
        store: StateStore,
        surface: Option<&mut dyn EditorSurface>,
    ) -> Result<Self, RecorderError> {
        let recorder = Self {
            state: RecorderState {
                recording,
                output,
                capture: None,
                workspace_root: workspace_root.into(),
            },
            store,
        };
        recorder.write_output_of(&recorder.state, surface)?;
        recorder.save()?;
        tracing::info!(
            steps = recorder.state.recording.len(),
            output = ?recorder.state.output,
            "recording session started"
        );
        Ok(recorder)
    }

    /// Reload the session persisted for `workspace_root`. Sessions writing to
    /// a document are only valid while `surface` still has it open.
    pub fn load(
        store: StateStore,
        workspace_root: &Path,
        surface: Option<&dyn EditorSurface>,
    ) -> Option<Self> {
        let state = store.load_where(workspace_root, |state: &RecorderState| {
            match (&state.output, surface) {
                (RecordingOutput::Document { id }, Some(surface)) => surface.is_open(*id),
                (RecordingOutput::Document { .. }, None) => false,
                (RecordingOutput::File { .. }, _) => true,
            }
        })?;
        Some(Self { state, store })
    }

    pub fn state(&self) -> &RecorderState {
        &self.state
    }

    pub fn recording(&self) -> &Recording {
        &self.state.recording
    }

    pub fn capture(&self) -> Option<&Capture> {
        self.state.capture.as_ref()
    }

    pub fn phase(&self) -> RecorderPhase {
        if self.state.capture.is_some() {
            RecorderPhase::Capturing
        } else {
            RecorderPhase::Idle
        }
    }

    /// Begin recording a step for `file`, whose pre-edit content has been
    /// copied to `snapshot`. The file must already be saved.
    pub fn start_capture(
        &mut self,
        file: impl Into<String>,
        snapshot: impl Into<PathBuf>,
    ) -> Result<(), RecorderError> {
        if let Some(capture) = &self.state.capture {
            return Err(RecorderError::CaptureInProgress {
                file: capture.file.clone(),
            });
        }
        let capture = Capture {
            file: file.into(),
            snapshot: snapshot.into(),
        };
        tracing::info!(
            file = %capture.file,
            snapshot = %capture.snapshot.display(),
            "capture started"
        );
        self.state.capture = Some(capture);
        if let Err(e) = self.save() {
            self.state.capture = None;
            return Err(e);
        }
        Ok(())
    }

    /// Snapshot `file` into a temporary copy and start capturing it.
    pub fn begin_capture(&mut self, file: &Path) -> Result<(), RecorderError> {
        if let Some(capture) = &self.state.capture {
            return Err(RecorderError::CaptureInProgress {
                file: capture.file.clone(),
            });
        }
        let absolute = if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.state.workspace_root.join(file)
        };
        let relative = absolute
            .strip_prefix(&self.state.workspace_root)
            .map_err(|_| RecorderError::OutsideWorkspace {
                path: absolute.clone(),
            })?
            .to_string_lossy()
            .into_owned();

        let (_, snapshot) = tempfile::Builder::new()
            .prefix("live-demo-snapshot-")
            .tempfile()
            .and_then(|file| file.keep().map_err(|e| e.error))
            .map_err(RecorderError::io(std::env::temp_dir()))?;
        fs::copy(&absolute, &snapshot).map_err(RecorderError::io(&absolute))?;

        self.start_capture(relative, snapshot)
    }

    /// Turn the edits made since [`start_capture`](Self::start_capture) into
    /// a step.
    ///
    /// With `start_empty` the step is recorded against an empty file, so
    /// playback types the whole content from scratch. When nothing changed
    /// the capture stays open.
    ///
    /// Document outputs are rewritten through `surface`; file outputs need
    /// none.
    pub fn finalize_capture(
        &mut self,
        mode: PlaybackMode,
        start_empty: bool,
        surface: Option<&mut dyn EditorSurface>,
    ) -> Result<Step, RecorderError> {
        let capture = self
            .state
            .capture
            .clone()
            .ok_or(RecorderError::NoCaptureInProgress)?;

        let before = if start_empty {
            String::new()
        } else {
            fs::read_to_string(&capture.snapshot).map_err(RecorderError::io(&capture.snapshot))?
        };
        let target = self.state.workspace_root.join(&capture.file);
        let after = fs::read_to_string(&target).map_err(RecorderError::io(&target))?;

        let patch = make_patch(&before, &after).ok_or_else(|| RecorderError::NoChangesDetected {
            file: capture.file.clone(),
        })?;

        let mut next = self.state.clone();
        let step = next
            .recording
            .add_step(&capture.file, patch, mode, start_empty)
            .clone();
        next.capture = None;

        self.write_output_of(&next, surface)?;
        self.store.save(&next.workspace_root, &next)?;
        self.state = next;
        discard_snapshot(&capture.snapshot);

        tracing::info!(
            file = %capture.file,
            mode = %mode,
            start_empty,
            steps = self.state.recording.len(),
            "step recorded"
        );
        Ok(step)
    }

    /// Abandon the current capture. The edited file is left as it is.
    pub fn cancel_capture(&mut self) -> Result<(), RecorderError> {
        let capture = self
            .state
            .capture
            .take()
            .ok_or(RecorderError::NoCaptureInProgress)?;
        if let Err(e) = self.save() {
            self.state.capture = Some(capture);
            return Err(e);
        }
        discard_snapshot(&capture.snapshot);
        tracing::info!(file = %capture.file, "capture cancelled");
        Ok(())
    }

    /// The recording in document form.
    pub fn export(&self) -> Result<String, RecorderError> {
        Ok(recording::serialize(&self.state.recording)?)
    }

    /// End the session and delete its persisted state.
    pub fn finish(self) -> Result<(), RecorderError> {
        if let Some(capture) = &self.state.capture {
            discard_snapshot(&capture.snapshot);
        }
        self.store
            .delete::<RecorderState>(&self.state.workspace_root)?;
        tracing::info!(steps = self.state.recording.len(), "recording session finished");
        Ok(())
    }

    fn write_output_of(
        &self,
        state: &RecorderState,
        surface: Option<&mut dyn EditorSurface>,
    ) -> Result<(), RecorderError> {
        match &state.output {
            RecordingOutput::File { path } => recording::write_to_path(&state.recording, path)?,
            RecordingOutput::Document { id } => {
                let surface = surface.ok_or(RecorderError::DocumentUnavailable { id: *id })?;
                surface.replace_text(*id, &recording::serialize(&state.recording)?)?;
            }
        }
        Ok(())
    }

    fn save(&self) -> Result<(), RecorderError> {
        self.store.save(&self.state.workspace_root, &self.state)?;
        Ok(())
    }
}

fn discard_snapshot(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove snapshot");
    }
}
