use serde::{Deserialize, Serialize};

/// A primitive editing action dispatched to the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Open (or create) the tab for a workspace-relative file.
    Open { file: String },
    /// Collapse the selection to a caret at `offset`.
    Move { offset: usize },
    /// Grow the selection by `extend` characters.
    Select { extend: usize },
    /// Erase the selection. An empty selection erases nothing.
    Delete,
    /// Insert text at the caret.
    Insert { text: String },
    /// Save the document.
    Save,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Open { .. } => "open",
            Action::Move { .. } => "move",
            Action::Select { .. } => "select",
            Action::Delete => "delete",
            Action::Insert { .. } => "insert",
            Action::Save => "save",
        }
    }
}

/// An action plus the base delay the driver waits after dispatching it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub action: Action,
    pub delay_ms: u64,
}

impl Instruction {
    pub fn new(action: Action, delay_ms: u64) -> Self {
        Self { action, delay_ms }
    }
}
