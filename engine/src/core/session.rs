//! Editing Session
//!
//! Ties together the marker set, the undo/redo history and the settings of
//! one annotated video. Every edit made here is recorded by the executor.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::{
    commands::{
        AddMarkerCommand, ClearMarkersCommand, Command, CommandExecutor, CommandResult,
        RemoveMarkerCommand,
    },
    document::OverlayDocument,
    drawings::MarkerSet,
    export::TextExporter,
    settings::OverlaySettings,
    CoreResult, Point2D, Timestamp,
};

// =============================================================================
// Session State
// =============================================================================

/// State mutated by commands
#[derive(Debug, Default)]
pub struct SessionState {
    pub markers: MarkerSet,
    /// Unsaved changes exist
    pub is_dirty: bool,
}

impl SessionState {
    /// Empty state styled from `settings`
    pub fn from_settings(settings: &OverlaySettings) -> Self {
        Self {
            markers: MarkerSet::new(settings.markers.style(), settings.fading.profile()),
            is_dirty: false,
        }
    }
}

// =============================================================================
// Active Session
// =============================================================================

pub struct ActiveSession {
    /// Document path, once saved or opened
    pub path: Option<PathBuf>,
    pub state: SessionState,
    pub executor: CommandExecutor,
    pub settings: OverlaySettings,
}

impl ActiveSession {
    pub fn new(settings: OverlaySettings) -> Self {
        Self {
            path: None,
            state: SessionState::from_settings(&settings),
            executor: CommandExecutor::new().with_max_history(settings.history.max_undo_steps),
            settings,
        }
    }

    /// Opens a saved document. History starts empty.
    pub fn open(path: &Path, settings: OverlaySettings) -> CoreResult<Self> {
        let document = OverlayDocument::load(path)?;
        let mut session = Self::new(settings);
        document.apply_to(&mut session.state.markers);
        session.path = Some(path.to_path_buf());
        Ok(session)
    }

    fn execute(&mut self, command: Box<dyn Command>) -> CoreResult<CommandResult> {
        self.executor.execute(command, &mut self.state)
    }

    /// Places a marker at `point`; returns the value it received
    pub fn place_marker(
        &mut self,
        point: Point2D,
        current_time: Timestamp,
        frame_interval: Timestamp,
    ) -> CoreResult<u32> {
        let result = self.execute(Box::new(AddMarkerCommand::new(
            point,
            current_time,
            frame_interval,
        )))?;
        Ok(result.added_value().unwrap_or_default())
    }

    /// Removes the selected marker, if any; returns its value
    pub fn remove_selected(&mut self) -> CoreResult<Option<u32>> {
        let Some(marker) = self.state.markers.selected_member() else {
            debug!("No marker selected, nothing to remove");
            return Ok(None);
        };
        let value = marker.value();
        self.execute(Box::new(RemoveMarkerCommand::new(marker)))?;
        Ok(Some(value))
    }

    /// Removes every marker; returns how many were removed
    pub fn clear_markers(&mut self) -> CoreResult<usize> {
        let count = self.state.markers.count();
        if count == 0 {
            return Ok(0);
        }
        self.execute(Box::new(ClearMarkersCommand::new()))?;
        Ok(count)
    }

    pub fn undo(&mut self) -> CoreResult<()> {
        self.executor.undo(&mut self.state)
    }

    pub fn redo(&mut self) -> CoreResult<CommandResult> {
        self.executor.redo(&mut self.state)
    }

    /// Snapshot of the session as a persistable document
    pub fn document(&self) -> OverlayDocument {
        OverlayDocument::from_markers(&self.state.markers)
    }

    /// Saves to `path` and remembers it. Resets the dirty flag.
    pub fn save(&mut self, path: &Path) -> CoreResult<()> {
        self.document().save(path)?;
        self.path = Some(path.to_path_buf());
        self.state.is_dirty = false;
        info!("Session saved, is_dirty reset to false");
        Ok(())
    }

    /// Best-effort text export using the configured format
    pub fn export_text(&self, path: &Path) {
        TextExporter::new(self.settings.export.clone()).export_to_file(path, &self.document());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{drawings::Drawable, CoreError};
    use tempfile::TempDir;

    fn session() -> ActiveSession {
        ActiveSession::new(OverlaySettings::default())
    }

    #[test]
    fn test_place_marker_allocates_and_dirties() {
        let mut session = session();
        assert_eq!(session.place_marker(Point2D::new(10.0, 10.0), 0, 40).unwrap(), 1);
        assert_eq!(session.place_marker(Point2D::new(90.0, 90.0), 40, 40).unwrap(), 2);
        assert!(session.state.is_dirty);
        assert_eq!(session.executor.undo_count(), 2);
    }

    #[test]
    fn test_remove_selected_and_refill_hole() {
        let mut session = session();
        for i in 0..3 {
            let offset = i as f64 * 100.0;
            session.place_marker(Point2D::new(offset, offset), 0, 40).unwrap();
        }
        // Select marker 2 through the set's hit test.
        session
            .state
            .markers
            .hit_test(Point2D::new(100.0, 100.0), 0);

        assert_eq!(session.remove_selected().unwrap(), Some(2));
        assert_eq!(session.remove_selected().unwrap(), None);
        assert_eq!(session.place_marker(Point2D::new(7.0, 7.0), 0, 40).unwrap(), 2);
    }

    #[test]
    fn test_clear_and_undo() {
        let mut session = session();
        session.place_marker(Point2D::new(10.0, 10.0), 0, 40).unwrap();
        session.place_marker(Point2D::new(90.0, 90.0), 0, 40).unwrap();

        assert_eq!(session.clear_markers().unwrap(), 2);
        assert_eq!(session.clear_markers().unwrap(), 0);
        session.undo().unwrap();
        assert_eq!(session.state.markers.values(), vec![1, 2]);

        session.redo().unwrap();
        assert!(session.state.markers.is_empty());
        assert!(matches!(session.redo(), Err(CoreError::NothingToRedo)));
    }

    #[test]
    fn test_history_limit_from_settings() {
        let mut settings = OverlaySettings::default();
        settings.history.max_undo_steps = 2;
        let mut session = ActiveSession::new(settings);
        for i in 0..4 {
            let offset = i as f64 * 100.0;
            session.place_marker(Point2D::new(offset, offset), 0, 40).unwrap();
        }
        assert_eq!(session.executor.undo_count(), 2);
    }

    #[test]
    fn test_save_and_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("overlay.json");

        let mut session = session();
        session.place_marker(Point2D::new(10.0, 10.0), 0, 40).unwrap();
        session.place_marker(Point2D::new(90.0, 90.0), 0, 40).unwrap();
        session.save(&path).unwrap();
        assert!(!session.state.is_dirty);
        assert_eq!(session.path.as_deref(), Some(path.as_path()));

        let reopened = ActiveSession::open(&path, OverlaySettings::default()).unwrap();
        assert_eq!(reopened.state.markers.values(), vec![1, 2]);
        assert!(!reopened.executor.can_undo());
        assert!(!reopened.state.is_dirty);
    }

    #[test]
    fn test_export_text_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("markers.txt");

        let mut session = session();
        session.place_marker(Point2D::new(10.0, 10.0), 80, 40).unwrap();
        session.export_text(&path);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("1\t10.00\t10.00\t80\t2"));
    }
}
