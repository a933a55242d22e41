use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::DriverError;
use super::instruction::Action;
use super::player::Player;
use super::surface::{DocumentId, EditorSurface};

const PROGRESS_CELLS: usize = 20;

/// How the driver turns an instruction's base delay into a wait.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pacing {
    /// Base delay scaled by a fresh factor drawn uniformly from `[0, 2)`.
    #[default]
    Jittered,
    /// Base delay as compiled.
    Fixed,
    /// No waiting at all.
    Immediate,
}

impl Pacing {
    pub fn delay(&self, base_ms: u64) -> Duration {
        match self {
            Pacing::Jittered => {
                let factor: f64 = rand::rng().random_range(0.0..2.0);
                Duration::from_millis((base_ms as f64 * factor) as u64)
            }
            Pacing::Fixed => Duration::from_millis(base_ms),
            Pacing::Immediate => Duration::ZERO,
        }
    }
}

/// Result of one [`Driver::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// An instruction was carried out; wait `delay` before the next tick.
    Dispatched { action: &'static str, delay: Duration },
    /// The current step has no instructions left.
    StepFinished,
    /// The playback session no longer exists.
    Stopped,
}

/// Feeds a player's instructions to an editor, one per tick.
#[derive(Debug)]
pub struct Driver<S> {
    surface: S,
    pacing: Pacing,
    active: Option<DocumentId>,
}

impl<S: EditorSurface> Driver<S> {
    pub fn new(surface: S, pacing: Pacing) -> Self {
        Self {
            surface,
            pacing,
            active: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Dispatch the player's next instruction.
    pub fn tick(&mut self, player: &mut Player) -> Result<Tick, DriverError> {
        if !player.is_active() {
            return Ok(Tick::Stopped);
        }

        let Some(instruction) = player.next_instruction()? else {
            if let Some(doc) = self.active {
                self.surface.set_status(doc, "");
            }
            return Ok(Tick::StepFinished);
        };

        let doc = self.dispatch(player, &instruction.action)?;
        if let Some(progress) = player.step_progress() {
            self.surface.set_status(doc, &progress_bar(progress));
        }

        let delay = self.pacing.delay(instruction.delay_ms);
        tracing::debug!(
            action = instruction.action.name(),
            completed = player.step_completed(),
            total = player.step_total(),
            delay_ms = delay.as_millis() as u64,
            "dispatched instruction"
        );
        Ok(Tick::Dispatched {
            action: instruction.action.name(),
            delay,
        })
    }

    /// Tick until the current step is drained or the session disappears,
    /// sleeping between instructions.
    pub async fn play_step(&mut self, player: &mut Player) -> Result<Tick, DriverError> {
        loop {
            match self.tick(player)? {
                Tick::Dispatched { delay, .. } => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                done => return Ok(done),
            }
        }
    }

    fn dispatch(&mut self, player: &Player, action: &Action) -> Result<DocumentId, DriverError> {
        match action {
            Action::Open { file } => {
                let doc = self.surface.open(file)?;
                self.active = Some(doc);
                Ok(doc)
            }
            Action::Move { offset } => {
                let doc = self.document(player)?;
                self.surface.set_selection(doc, *offset..*offset)?;
                Ok(doc)
            }
            Action::Select { extend } => {
                let doc = self.document(player)?;
                let selection = self.surface.selection(doc)?;
                self.surface
                    .set_selection(doc, selection.start..selection.end + extend)?;
                Ok(doc)
            }
            Action::Delete => {
                let doc = self.document(player)?;
                self.surface.erase_selection(doc)?;
                Ok(doc)
            }
            Action::Insert { text } => {
                let doc = self.document(player)?;
                let caret = self.surface.selection(doc)?.start;
                self.surface.insert(doc, caret, text)?;
                Ok(doc)
            }
            Action::Save => {
                let doc = self.document(player)?;
                self.surface.save(doc)?;
                Ok(doc)
            }
        }
    }

    /// The document instructions apply to. After a restart the open tab is
    /// unknown, so the current step's file is opened again.
    fn document(&mut self, player: &Player) -> Result<DocumentId, DriverError> {
        if let Some(doc) = self.active.filter(|doc| self.surface.is_open(*doc)) {
            return Ok(doc);
        }
        let file = player
            .current_step()
            .map(|step| step.target_file.clone())
            .ok_or(DriverError::NoDocument)?;
        let doc = self.surface.open(&file)?;
        self.active = Some(doc);
        Ok(doc)
    }
}

/// `Step progress: |#####---------------|`
pub fn progress_bar(progress: f64) -> String {
    let full = ((progress.clamp(0.0, 1.0)) * PROGRESS_CELLS as f64) as usize;
    format!(
        "Step progress: |{}{}|",
        "#".repeat(full),
        "-".repeat(PROGRESS_CELLS - full)
    )
}
