//! Command Trait Definition
//!
//! Defines the trait that all marker edits implement.

use serde::{Deserialize, Serialize};

use crate::core::{session::SessionState, CoreResult, OpId};

/// Command execution result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    /// Generated Operation ID
    pub op_id: OpId,

    /// List of state changes
    pub changes: Vec<StateChange>,
}

impl CommandResult {
    pub fn new(op_id: &str) -> Self {
        Self {
            op_id: op_id.to_string(),
            changes: vec![],
        }
    }

    pub fn with_change(mut self, change: StateChange) -> Self {
        self.changes.push(change);
        self
    }

    /// Value of the first marker added by this command, if any
    pub fn added_value(&self) -> Option<u32> {
        self.changes.iter().find_map(|change| match change {
            StateChange::MarkerAdded { value } => Some(*value),
            _ => None,
        })
    }
}

/// State change types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StateChange {
    MarkerAdded { value: u32 },
    MarkerRemoved { value: u32 },
    MarkersCleared { count: usize },
}

/// Generates a new operation ID
pub(crate) fn new_op_id() -> OpId {
    ulid::Ulid::new().to_string()
}

/// Trait that all marker edits implement.
///
/// - Every change to the marker set in an editing session goes through a Command.
/// - A command is only undone after `execute` succeeded.
/// - On failure, `execute` leaves the state unchanged.
pub trait Command {
    /// Executes the command.
    ///
    /// Uses `&mut self` so the command can record what it needs for undo.
    fn execute(&mut self, state: &mut SessionState) -> CoreResult<CommandResult>;

    /// Inverse of `execute`.
    fn undo(&self, state: &mut SessionState) -> CoreResult<()>;

    /// Re-applies the command after an undo. Defaults to `execute`.
    fn redo(&mut self, state: &mut SessionState) -> CoreResult<CommandResult> {
        self.execute(state)
    }

    /// Command type name, used for logging and debugging
    fn type_name(&self) -> &'static str;

    fn to_json(&self) -> serde_json::Value;
}
