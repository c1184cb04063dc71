//! Marker Commands
//!
//! Undoable edits of the session's marker set. Replays go through the
//! type-erased [`MultiDrawing`] surface, the same way a host's history would
//! drive any multi-item drawing.

use crate::core::{
    commands::{new_op_id, Command, CommandResult, StateChange},
    drawings::{MultiDrawing, NumberedMarker},
    session::SessionState,
    CoreError, CoreResult, Point2D, Timestamp,
};

fn ensure_present(state: &SessionState, marker: &NumberedMarker) -> CoreResult<()> {
    if state.markers.iter().any(|m| m.id() == marker.id()) {
        Ok(())
    } else {
        Err(CoreError::ValidationError(format!(
            "Marker {} is not part of the session",
            marker.value()
        )))
    }
}

// =============================================================================
// AddMarkerCommand
// =============================================================================

/// Places a new marker at the next free value
#[derive(Debug)]
pub struct AddMarkerCommand {
    point: Point2D,
    placed_at: Timestamp,
    frame_interval: Timestamp,
    /// Marker created by the first execution, replayed on redo
    placed: Option<NumberedMarker>,
}

impl AddMarkerCommand {
    pub fn new(point: Point2D, placed_at: Timestamp, frame_interval: Timestamp) -> Self {
        Self {
            point,
            placed_at,
            frame_interval,
            placed: None,
        }
    }

    pub fn placed(&self) -> Option<&NumberedMarker> {
        self.placed.as_ref()
    }
}

impl Command for AddMarkerCommand {
    fn execute(&mut self, state: &mut SessionState) -> CoreResult<CommandResult> {
        let value = match &self.placed {
            Some(marker) => {
                if state.markers.contains_value(marker.value()) {
                    return Err(CoreError::ValidationError(format!(
                        "Marker value {} is already in use",
                        marker.value()
                    )));
                }
                state.markers.add_item(Box::new(marker.clone()));
                marker.value()
            }
            None => {
                let value =
                    state
                        .markers
                        .add_new(self.point, self.placed_at, self.frame_interval);
                self.placed = state.markers.selected_member();
                value
            }
        };

        Ok(CommandResult::new(&new_op_id()).with_change(StateChange::MarkerAdded { value }))
    }

    fn undo(&self, state: &mut SessionState) -> CoreResult<()> {
        let marker = self
            .placed
            .as_ref()
            .ok_or_else(|| CoreError::Internal("AddMarker undone before execution".into()))?;
        state.markers.remove_item(marker);
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "AddMarker"
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "point": self.point,
            "placedAt": self.placed_at,
            "frameInterval": self.frame_interval,
            "value": self.placed.as_ref().map(|m| m.value()),
        })
    }
}

// =============================================================================
// RemoveMarkerCommand
// =============================================================================

/// Removes one marker, leaving a hole in the numbering
#[derive(Debug)]
pub struct RemoveMarkerCommand {
    marker: NumberedMarker,
}

impl RemoveMarkerCommand {
    pub fn new(marker: NumberedMarker) -> Self {
        Self { marker }
    }
}

impl Command for RemoveMarkerCommand {
    fn execute(&mut self, state: &mut SessionState) -> CoreResult<CommandResult> {
        ensure_present(state, &self.marker)?;
        state.markers.remove_item(&self.marker);

        Ok(CommandResult::new(&new_op_id()).with_change(StateChange::MarkerRemoved {
            value: self.marker.value(),
        }))
    }

    fn undo(&self, state: &mut SessionState) -> CoreResult<()> {
        state.markers.add_item(Box::new(self.marker.clone()));
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "RemoveMarker"
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "value": self.marker.value() })
    }
}

// =============================================================================
// ClearMarkersCommand
// =============================================================================

/// Removes every marker; undo restores them all
#[derive(Debug, Default)]
pub struct ClearMarkersCommand {
    removed: Vec<NumberedMarker>,
}

impl ClearMarkersCommand {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Command for ClearMarkersCommand {
    fn execute(&mut self, state: &mut SessionState) -> CoreResult<CommandResult> {
        self.removed = state.markers.iter().cloned().collect();
        MultiDrawing::clear(&mut state.markers);

        Ok(
            CommandResult::new(&new_op_id()).with_change(StateChange::MarkersCleared {
                count: self.removed.len(),
            }),
        )
    }

    fn undo(&self, state: &mut SessionState) -> CoreResult<()> {
        for marker in &self.removed {
            state.markers.add_item(Box::new(marker.clone()));
        }
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "ClearMarkers"
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "count": self.removed.len() })
    }
}
