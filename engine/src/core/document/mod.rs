//! Overlay Document
//!
//! Envelope around the drawing fragments of a session. The marker set only
//! knows how to emit and read its own fragment; this module owns versioning,
//! timestamps and the file on disk.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::{
    drawings::{FragmentElement, MarkerRecord, MarkerSet},
    fs::{atomic_write_json_pretty, read_json},
    CoreError, CoreResult,
};

/// Current document schema version
pub const DOCUMENT_VERSION: u32 = 1;

/// Persisted overlay annotations of one video
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayDocument {
    pub version: u32,
    /// RFC 3339 time of the last save
    #[serde(default)]
    pub saved_at: String,
    /// Numbered marker fragment, in value order
    #[serde(default)]
    pub numbered_markers: Vec<FragmentElement>,
}

impl Default for OverlayDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            saved_at: String::new(),
            numbered_markers: Vec::new(),
        }
    }
}

impl OverlayDocument {
    /// Captures the current state of `markers`
    pub fn from_markers(markers: &MarkerSet) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            saved_at: chrono::Utc::now().to_rfc3339(),
            numbered_markers: markers.write_fragment(),
        }
    }

    /// Replaces the content of `markers` with this document's markers.
    ///
    /// Returns the number of markers restored.
    pub fn apply_to(&self, markers: &mut MarkerSet) -> usize {
        markers.clear();
        let restored = markers.read_fragment(&self.numbered_markers);
        let skipped = self.numbered_markers.len() - restored;
        if skipped > 0 {
            warn!(skipped, "Some markers could not be restored");
        }
        restored
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.version == 0 {
            return Err(CoreError::InvalidDocument(
                "Document version is missing".to_string(),
            ));
        }
        if self.version > DOCUMENT_VERSION {
            return Err(CoreError::UnsupportedDocumentVersion {
                found: self.version,
                supported: DOCUMENT_VERSION,
            });
        }
        Ok(())
    }

    pub fn to_json_string(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(content: &str) -> CoreResult<Self> {
        let document: Self = serde_json::from_str(content)?;
        document.validate()?;
        Ok(document)
    }

    /// Writes the document atomically
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        atomic_write_json_pretty(path, self)?;
        info!(
            markers = self.numbered_markers.len(),
            "Overlay document saved to {:?}", path
        );
        Ok(())
    }

    pub fn load(path: &Path) -> CoreResult<Self> {
        let document: Self = read_json(path)?;
        document.validate()?;
        info!(
            markers = document.numbered_markers.len(),
            "Overlay document loaded from {:?}", path
        );
        Ok(document)
    }

    /// Marker records in document order
    pub fn marker_records(&self) -> impl Iterator<Item = &MarkerRecord> {
        self.numbered_markers.iter().map(|element| match element {
            FragmentElement::NumberedMarker(record) => record,
        })
    }
}
