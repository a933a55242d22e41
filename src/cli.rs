//! Command-line surface of the `live-demo` binary.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use crate::capture::{Recorder, RecorderError, RecordingOutput};
use crate::config::Config;
use crate::playback::{BufferSurface, Driver, Pacing, Player, PlayerError, PlayerPhase, Tick};
use crate::recording::{self, PlaybackMode};
use crate::state::StateStore;

/// Replay recorded file edits as live typing
#[derive(Debug, Parser)]
#[command(name = "live-demo")]
#[command(about = "Record file edits and replay them as live typing")]
#[command(version)]
pub struct Cli {
    /// Data directory (config, logs, session state). Defaults to ~/.live-demo
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Workspace root. Defaults to the current directory
    #[arg(long, global = true, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Dispatch instructions without waiting between them
    #[arg(long, global = true)]
    pub instant: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a recording and start a playback session
    Load {
        /// Recording document
        file: PathBuf,
    },

    /// Play the next step (or finish the one interrupted)
    Next,

    /// Show the playback and recording sessions
    Status,

    /// Rewind playback to before the first step
    Reset,

    /// End the playback session
    Stop,

    /// Record a new demo
    #[command(subcommand)]
    Record(RecordCommand),
}

#[derive(Debug, Subcommand)]
pub enum RecordCommand {
    /// Start a recording session writing to FILE (appends if it exists)
    New {
        /// Recording document to write
        file: PathBuf,
    },

    /// Snapshot FILE before editing it
    Begin {
        /// Workspace file about to be edited
        file: PathBuf,
    },

    /// Record the edits made since `begin` as a step
    Commit {
        /// How the step's text is entered on playback
        #[arg(long, default_value_t = PlaybackMode::Type)]
        mode: PlaybackMode,

        /// Play the step into an emptied file
        #[arg(long)]
        start_empty: bool,
    },

    /// Drop the capture started by `begin`
    Cancel,

    /// End the recording session
    Finish,
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let workspace = match &cli.workspace {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let workspace = workspace
        .canonicalize()
        .with_context(|| format!("Workspace {} not found", workspace.display()))?;

    let pacing = if cli.instant {
        Pacing::Immediate
    } else {
        config.playback.pacing
    };
    let ctx = Session {
        store: config.state_store(),
        config,
        workspace,
        pacing,
    };

    match cli.command {
        Command::Load { file } => ctx.load(&file),
        Command::Next => ctx.next().await,
        Command::Status => ctx.status(),
        Command::Reset => ctx.reset(),
        Command::Stop => ctx.stop(),
        Command::Record(command) => ctx.record(command),
    }
}

struct Session {
    store: StateStore,
    config: Config,
    workspace: PathBuf,
    pacing: Pacing,
}

impl Session {
    fn player(&self) -> Result<Player> {
        Player::load(
            self.store.clone(),
            &self.workspace,
            self.config.playback.timing,
        )
        .ok_or_else(|| anyhow!("No recording loaded; run `live-demo load <file>` first"))
    }

    /// The headless editor, with whatever unsaved buffers an interrupted
    /// `next` left behind.
    fn surface(&self) -> BufferSurface {
        BufferSurface::with_store(self.workspace.clone(), self.store.clone())
    }

    fn recorder(&self) -> Result<Recorder> {
        Recorder::load(self.store.clone(), &self.workspace, None)
            .ok_or_else(|| anyhow!("No recording session; run `live-demo record new <file>` first"))
    }

    fn load(&self, file: &Path) -> Result<()> {
        let recording = recording::read_from_path(file)
            .with_context(|| format!("Failed to load recording {}", file.display()))?;
        let player = Player::new(
            recording,
            self.workspace.clone(),
            self.store.clone(),
            self.config.playback.timing,
        )?;
        self.surface().discard()?;
        println!(
            "Loaded {} ({} steps)",
            file.display(),
            player.total_steps()
        );
        Ok(())
    }

    async fn next(&self) -> Result<()> {
        let mut player = self.player()?;

        if player.pending().is_empty() {
            match player.advance_step().map(|_| ()) {
                Ok(()) => {}
                Err(PlayerError::NoSuchStep { total, .. }) => {
                    player.stop()?;
                    println!("All {total} steps played; playback stopped");
                    return Ok(());
                }
                Err(e) => return Err(e).context("Failed to start the next step"),
            }
        }

        let (index, file) = match (player.current_step_index(), player.current_step()) {
            (Some(index), Some(step)) => (index, step.target_file.clone()),
            _ => return Err(anyhow!("No step to play")),
        };
        println!("Step {}/{}: {}", index + 1, player.total_steps(), file);

        let mut driver = Driver::new(self.surface(), self.pacing);
        let outcome = driver.play_step(&mut player).await?;
        driver.surface().discard()?;
        match outcome {
            Tick::Stopped => println!("Playback was stopped"),
            _ => println!("Step {} done", index + 1),
        }
        Ok(())
    }

    fn status(&self) -> Result<()> {
        let player = Player::load(
            self.store.clone(),
            &self.workspace,
            self.config.playback.timing,
        );
        let recorder = Recorder::load(self.store.clone(), &self.workspace, None);

        if player.is_none() && recorder.is_none() {
            println!("No active session in {}", self.workspace.display());
            return Ok(());
        }

        if let Some(player) = player {
            let total = player.total_steps();
            match player.phase() {
                PlayerPhase::Unstarted => println!("Playback: {total} steps, not started"),
                PlayerPhase::InStep => {
                    let index = player.current_step_index().map_or(0, |i| i + 1);
                    let percent = player.step_progress().unwrap_or(0.0) * 100.0;
                    println!("Playback: step {index}/{total} in progress ({percent:.0}%)");
                }
                PlayerPhase::StepDone => {
                    let index = player.current_step_index().map_or(0, |i| i + 1);
                    println!("Playback: step {index}/{total} done");
                }
                PlayerPhase::Finished => println!("Playback: all {total} steps played"),
            }
        }

        if let Some(recorder) = recorder {
            let output = match &recorder.state().output {
                RecordingOutput::File { path } => path.display().to_string(),
                RecordingOutput::Document { id } => format!("document {}", id.0),
            };
            println!(
                "Recording: {} steps into {}",
                recorder.recording().len(),
                output
            );
            if let Some(capture) = recorder.capture() {
                println!("Capturing: {}", capture.file);
            }
        }
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        let mut player = self.player()?;
        player.reset()?;
        self.surface().discard()?;
        println!("Playback rewound to the first step");
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.player()?.stop()?;
        self.surface().discard()?;
        println!("Playback stopped");
        Ok(())
    }

    fn record(&self, command: RecordCommand) -> Result<()> {
        match command {
            RecordCommand::New { file } => {
                let path = absolute(&file)?;
                let recorder =
                    Recorder::for_file(path.clone(), self.workspace.clone(), self.store.clone())
                        .with_context(|| format!("Failed to start recording {}", path.display()))?;
                println!(
                    "Recording into {} ({} existing steps)",
                    path.display(),
                    recorder.recording().len()
                );
            }
            RecordCommand::Begin { file } => {
                let mut recorder = self.recorder()?;
                let path = absolute(&file)?
                    .canonicalize()
                    .with_context(|| format!("{} not found", file.display()))?;
                recorder.begin_capture(&path)?;
                println!("Capturing {}; edit and save it, then run `record commit`", file.display());
            }
            RecordCommand::Commit { mode, start_empty } => {
                let mut recorder = self.recorder()?;
                match recorder.finalize_capture(mode, start_empty, None) {
                    Ok(step) => println!(
                        "Recorded step {} ({}, {})",
                        recorder.recording().len(),
                        step.target_file,
                        step.playback_mode
                    ),
                    Err(RecorderError::NoChangesDetected { file }) => {
                        println!("No changes in {file}; still capturing");
                    }
                    Err(e) => return Err(e).context("Failed to record step"),
                }
            }
            RecordCommand::Cancel => {
                self.recorder()?.cancel_capture()?;
                println!("Capture cancelled");
            }
            RecordCommand::Finish => {
                let recorder = self.recorder()?;
                let steps = recorder.recording().len();
                recorder.finish()?;
                println!("Recording finished with {steps} steps");
            }
        }
        Ok(())
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path))
}
