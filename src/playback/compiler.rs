use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::diff::{derive_operations, EditOperation, PatchError};
use crate::recording::{PlaybackMode, Step};

use super::instruction::{Action, Instruction};

/// Base delays attached to compiled instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackTiming {
    /// Open, move, delete, insert and save.
    pub base_delay_ms: u64,
    /// Each one-character selection extension.
    pub extend_delay_ms: u64,
    /// The pause on a finished selection before it is deleted.
    pub hold_delay_ms: u64,
}

impl Default for PlaybackTiming {
    fn default() -> Self {
        Self {
            base_delay_ms: 70,
            extend_delay_ms: 35,
            hold_delay_ms: 700,
        }
    }
}

/// Instructions for one step, plus the text the file will hold afterwards.
#[derive(Debug, Clone)]
pub struct CompiledStep {
    pub instructions: VecDeque<Instruction>,
    pub final_text: String,
}

/// Compile `step` against the file's current content `initial_text`.
pub fn compile(
    step: &Step,
    initial_text: &str,
    timing: &PlaybackTiming,
) -> Result<CompiledStep, PatchError> {
    let reconciled = derive_operations(initial_text, &step.patch)?;

    let mut instructions = VecDeque::new();
    instructions.push_back(Instruction::new(
        Action::Open {
            file: step.target_file.clone(),
        },
        timing.base_delay_ms,
    ));
    for op in &reconciled.operations {
        push_edit(&mut instructions, op, step.playback_mode, timing);
    }
    instructions.push_back(Instruction::new(Action::Save, timing.base_delay_ms));

    Ok(CompiledStep {
        instructions,
        final_text: reconciled.final_text,
    })
}

fn push_edit(
    out: &mut VecDeque<Instruction>,
    op: &EditOperation,
    mode: PlaybackMode,
    timing: &PlaybackTiming,
) {
    out.push_back(Instruction::new(
        Action::Move { offset: op.start },
        timing.base_delay_ms,
    ));

    let removed = op.removed();
    for _ in 1..removed {
        out.push_back(Instruction::new(
            Action::Select { extend: 1 },
            timing.extend_delay_ms,
        ));
    }
    // Always hold before deleting, even for a pure insertion, so every edit
    // has the same rhythm. A pure insertion must not select anything.
    out.push_back(Instruction::new(
        Action::Select {
            extend: removed.min(1),
        },
        timing.hold_delay_ms,
    ));
    out.push_back(Instruction::new(Action::Delete, timing.base_delay_ms));

    match mode {
        PlaybackMode::Paste => out.push_back(Instruction::new(
            Action::Insert {
                text: op.replacement.clone(),
            },
            timing.base_delay_ms,
        )),
        PlaybackMode::Type => {
            for c in op.replacement.chars() {
                out.push_back(Instruction::new(
                    Action::Insert {
                        text: c.to_string(),
                    },
                    timing.base_delay_ms,
                ));
            }
        }
    }
}
