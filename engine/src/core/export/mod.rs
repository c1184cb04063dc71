//! Export Module
//!
//! Format conversions of overlay documents for use outside the editor.

pub mod text;

pub use text::TextExporter;
