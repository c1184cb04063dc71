//! Tab-separated text export of numbered markers.
//!
//! One line per marker, in value order: value, x, y, timestamp, frame index.
//! Exporting is a convenience path: failures are logged and swallowed.

use std::fmt::Write as _;
use std::path::Path;

use tracing::{error, info};

use crate::core::{
    document::OverlayDocument, drawings::MarkerRecord, fs::atomic_write_bytes,
    settings::ExportSettings, CoreError, CoreResult,
};

/// Column names of the export, tab separated
pub const HEADER_COLUMNS: [&str; 5] = ["value", "x", "y", "timestamp", "frame"];

#[derive(Clone, Debug, Default)]
pub struct TextExporter {
    settings: ExportSettings,
}

impl TextExporter {
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    /// Renders the export text for `document`
    pub fn render(&self, document: &OverlayDocument) -> String {
        let mut out = String::new();
        if self.settings.include_header {
            out.push_str(&HEADER_COLUMNS.join("\t"));
            out.push('\n');
        }
        for record in document.marker_records() {
            self.render_line(&mut out, record);
        }
        out
    }

    fn render_line(&self, out: &mut String, record: &MarkerRecord) {
        let precision = self.settings.decimal_places;
        let frame = if record.frame_interval > 0 {
            record.placed_at / record.frame_interval
        } else {
            record.placed_at
        };
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "{}\t{:.*}\t{:.*}\t{}\t{}",
            record.value,
            precision,
            record.position.x,
            precision,
            record.position.y,
            record.placed_at,
            frame
        );
    }

    /// Writes the export to `path`, reporting failures.
    pub fn write(&self, path: &Path, document: &OverlayDocument) -> CoreResult<()> {
        let text = self.render(document);
        atomic_write_bytes(path, text.as_bytes())
            .map_err(|e| CoreError::ExportFailed(format!("{}: {}", path.display(), e)))
    }

    /// Best-effort export: errors are logged and never propagated.
    pub fn export_to_file(&self, path: &Path, document: &OverlayDocument) {
        match self.write(path, document) {
            Ok(()) => info!(
                markers = document.numbered_markers.len(),
                "Exported markers to {:?}", path
            ),
            Err(e) => error!(
                error = %e,
                details = ?e,
                path = %path.display(),
                "Exception during text export"
            ),
        }
    }
}
