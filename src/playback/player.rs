use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::recording::{Recording, Step};
use crate::state::{Persistent, StateStore};

use super::compiler::{compile, PlaybackTiming};
use super::error::PlayerError;
use super::instruction::Instruction;

/// Everything the player persists between instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub recording: Recording,
    pub current_step: Option<usize>,
    pub pending: VecDeque<Instruction>,
    pub step_completed: usize,
    pub step_total: usize,
    pub workspace_root: PathBuf,
}

impl Persistent for PlaybackState {
    const STATE_KEY: &'static str = "live-demo-playback";
    const VERSION: u32 = 1;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerPhase {
    /// No step has been started.
    Unstarted,
    /// Instructions of the current step are queued.
    InStep,
    /// The current step is drained and more steps remain.
    StepDone,
    /// The last step is drained.
    Finished,
}

/// Resumable playback of a recording.
///
/// Every state change is written through to the [`StateStore`], so a player
/// reloaded with [`Player::load`] continues exactly where the previous one
/// left off.
#[derive(Debug)]
pub struct Player {
    state: PlaybackState,
    store: StateStore,
    timing: PlaybackTiming,
}

impl Player {
    /// Start a new playback session, replacing any previous one for the
    /// workspace.
    pub fn new(
        recording: Recording,
        workspace_root: impl Into<PathBuf>,
        store: StateStore,
        timing: PlaybackTiming,
    ) -> Result<Self, PlayerError> {
        let player = Self {
            state: PlaybackState {
                recording,
                current_step: None,
                pending: VecDeque::new(),
                step_completed: 0,
                step_total: 0,
                workspace_root: workspace_root.into(),
            },
            store,
            timing,
        };
        player.save()?;
        tracing::info!(
            steps = player.total_steps(),
            workspace = %player.workspace_root().display(),
            "loaded recording for playback"
        );
        Ok(player)
    }

    /// Reload the session persisted for `workspace_root`, if any.
    pub fn load(store: StateStore, workspace_root: &Path, timing: PlaybackTiming) -> Option<Self> {
        let state = store.load::<PlaybackState>(workspace_root)?;
        Some(Self {
            state,
            store,
            timing,
        })
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn recording(&self) -> &Recording {
        &self.state.recording
    }

    pub fn workspace_root(&self) -> &Path {
        &self.state.workspace_root
    }

    pub fn total_steps(&self) -> usize {
        self.state.recording.len()
    }

    pub fn current_step_index(&self) -> Option<usize> {
        self.state.current_step
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.state
            .current_step
            .and_then(|index| self.state.recording.step(index))
    }

    pub fn pending(&self) -> &VecDeque<Instruction> {
        &self.state.pending
    }

    pub fn step_completed(&self) -> usize {
        self.state.step_completed
    }

    pub fn step_total(&self) -> usize {
        self.state.step_total
    }

    /// Whether the persisted session still exists. A session stopped from
    /// elsewhere leaves this player with nothing to do.
    pub fn is_active(&self) -> bool {
        self.store.exists::<PlaybackState>(self.workspace_root())
    }

    pub fn phase(&self) -> PlayerPhase {
        match self.state.current_step {
            None => PlayerPhase::Unstarted,
            Some(_) if !self.state.pending.is_empty() => PlayerPhase::InStep,
            Some(_) if self.has_more_steps() => PlayerPhase::StepDone,
            Some(_) => PlayerPhase::Finished,
        }
    }

    /// Whether [`advance_step`](Self::advance_step) is still worth calling.
    /// Always true before the first step, even for an empty recording,
    /// whose first advance reports [`PlayerError::NoSuchStep`].
    pub fn has_more_steps(&self) -> bool {
        match self.state.current_step {
            None => true,
            Some(index) => index + 1 < self.state.recording.len(),
        }
    }

    /// Move to the next step and compile its instructions.
    ///
    /// On error the player, both in memory and on disk, is left unchanged.
    pub fn advance_step(&mut self) -> Result<&Step, PlayerError> {
        if let (Some(step), false) = (self.state.current_step, self.state.pending.is_empty()) {
            return Err(PlayerError::StepInProgress {
                step,
                remaining: self.state.pending.len(),
            });
        }

        let index = self.state.current_step.map_or(0, |current| current + 1);
        let total = self.state.recording.len();
        let step = self
            .state
            .recording
            .step(index)
            .ok_or(PlayerError::NoSuchStep { index, total })?;

        let path = self.state.workspace_root.join(&step.target_file);
        let target_err = |source: std::io::Error| PlayerError::Target {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(target_err)?;
        }

        let initial_text = if step.start_empty {
            String::new()
        } else {
            fs::read_to_string(&path).map_err(target_err)?
        };

        let compiled =
            compile(step, &initial_text, &self.timing).map_err(|source| PlayerError::Patch {
                step: index,
                file: step.target_file.clone(),
                source,
            })?;

        if step.start_empty {
            fs::write(&path, "").map_err(target_err)?;
        }

        let mut next = self.state.clone();
        next.current_step = Some(index);
        next.step_total = compiled.instructions.len();
        next.step_completed = 0;
        next.pending = compiled.instructions;
        self.store.save(self.workspace_root(), &next)?;
        self.state = next;

        tracing::info!(
            step = index + 1,
            total,
            file = %path.display(),
            instructions = self.state.step_total,
            "advanced to step"
        );
        Ok(&self.state.recording.steps()[index])
    }

    /// Dequeue the next instruction, or `None` once the step is drained.
    ///
    /// Each call, including one that finds the queue empty, counts as one
    /// completed instruction and is persisted before returning.
    pub fn next_instruction(&mut self) -> Result<Option<Instruction>, PlayerError> {
        let instruction = self.state.pending.pop_front();
        self.state.step_completed += 1;
        self.save()?;
        Ok(instruction)
    }

    /// Fraction of the current step dispatched so far, for progress
    /// display. `None` before any step has been compiled.
    pub fn step_progress(&self) -> Option<f64> {
        if self.state.step_total == 0 {
            return None;
        }
        Some((self.state.step_completed as f64 / self.state.step_total as f64).min(1.0))
    }

    /// Rewind so the next [`advance_step`](Self::advance_step) starts from the
    /// first step.
    pub fn reset(&mut self) -> Result<(), PlayerError> {
        self.state.current_step = None;
        self.state.pending.clear();
        self.state.step_completed = 0;
        self.state.step_total = 0;
        self.save()?;
        tracing::info!(workspace = %self.workspace_root().display(), "playback reset");
        Ok(())
    }

    /// End the session and delete its persisted state.
    pub fn stop(self) -> Result<(), PlayerError> {
        let existed = self
            .store
            .delete::<PlaybackState>(&self.state.workspace_root)?;
        tracing::info!(
            workspace = %self.state.workspace_root.display(),
            existed,
            "playback stopped"
        );
        Ok(())
    }

    fn save(&self) -> Result<(), PlayerError> {
        self.store.save(self.workspace_root(), &self.state)?;
        Ok(())
    }
}
