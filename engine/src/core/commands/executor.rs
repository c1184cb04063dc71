//! Command Executor Module
//!
//! Runs commands against the session state and keeps the bounded undo/redo
//! history.

use std::collections::VecDeque;

use tracing::debug;

use crate::core::{
    commands::{Command, CommandResult},
    session::SessionState,
    CoreError, CoreResult, OpId,
};

/// Default number of undoable steps
pub const DEFAULT_MAX_HISTORY: usize = 100;

// =============================================================================
// History Entry
// =============================================================================

/// Entry in the undo/redo history
pub struct HistoryEntry {
    pub op_id: OpId,
    pub command: Box<dyn Command>,
    pub result: CommandResult,
    /// RFC 3339 time the command last ran
    pub timestamp: String,
}

impl std::fmt::Debug for HistoryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryEntry")
            .field("op_id", &self.op_id)
            .field("type", &self.command.type_name())
            .field("result", &self.result)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

impl HistoryEntry {
    fn new(command: Box<dyn Command>, result: CommandResult) -> Self {
        Self {
            op_id: result.op_id.clone(),
            command,
            result,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

// =============================================================================
// Command Executor
// =============================================================================

/// Executes commands and manages undo/redo history
pub struct CommandExecutor {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: VecDeque<HistoryEntry>,
    max_history_size: usize,
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_history_size: DEFAULT_MAX_HISTORY,
        }
    }

    /// Sets the maximum history size (at least one step is kept)
    pub fn with_max_history(mut self, size: usize) -> Self {
        self.max_history_size = size.max(1);
        self
    }

    /// Executes a command and adds it to history
    pub fn execute(
        &mut self,
        mut command: Box<dyn Command>,
        state: &mut SessionState,
    ) -> CoreResult<CommandResult> {
        let result = command.execute(state)?;
        debug!(
            op_id = %result.op_id,
            command = command.type_name(),
            payload = %command.to_json(),
            "Command executed"
        );

        // A new edit invalidates everything that was undone.
        self.redo_stack.clear();

        self.undo_stack
            .push_back(HistoryEntry::new(command, result.clone()));
        while self.undo_stack.len() > self.max_history_size {
            self.undo_stack.pop_front();
        }

        state.is_dirty = true;

        Ok(result)
    }

    /// Undoes the last command
    pub fn undo(&mut self, state: &mut SessionState) -> CoreResult<()> {
        let entry = self.undo_stack.pop_back().ok_or(CoreError::NothingToUndo)?;

        if let Err(e) = entry.command.undo(state) {
            self.undo_stack.push_back(entry);
            return Err(e);
        }
        debug!(op_id = %entry.op_id, command = entry.command.type_name(), "Command undone");

        self.redo_stack.push_back(entry);
        state.is_dirty = true;

        Ok(())
    }

    /// Redoes the last undone command
    pub fn redo(&mut self, state: &mut SessionState) -> CoreResult<CommandResult> {
        let mut entry = self.redo_stack.pop_back().ok_or(CoreError::NothingToRedo)?;

        let result = match entry.command.redo(state) {
            Ok(result) => result,
            Err(e) => {
                self.redo_stack.push_back(entry);
                return Err(e);
            }
        };
        debug!(op_id = %result.op_id, command = entry.command.type_name(), "Command redone");

        entry.op_id = result.op_id.clone();
        entry.result = result.clone();
        entry.timestamp = chrono::Utc::now().to_rfc3339();
        self.undo_stack.push_back(entry);

        state.is_dirty = true;

        Ok(result)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clears all history (undo and redo)
    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Type name of the command the next undo would revert
    pub fn last_command_type(&self) -> Option<&'static str> {
        self.undo_stack.back().map(|e| e.command.type_name())
    }

    /// Type name of the command the next redo would replay
    pub fn last_undone_command_type(&self) -> Option<&'static str> {
        self.redo_stack.back().map(|e| e.command.type_name())
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
