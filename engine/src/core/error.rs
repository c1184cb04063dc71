//! vidmark Error Definitions
//!
//! Defines error types used throughout the engine.

use thiserror::Error;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Drawing Errors
    // =========================================================================
    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    // =========================================================================
    // Document Errors
    // =========================================================================
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Unsupported document version {found} (supported up to {supported})")]
    UnsupportedDocumentVersion { found: u32, supported: u32 },

    #[error("Export failed: {0}")]
    ExportFailed(String),

    // =========================================================================
    // Command Errors
    // =========================================================================
    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;
