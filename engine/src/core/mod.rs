//! vidmark Core Engine
//!
//! Overlay model, numbering, interaction, history and persistence of
//! numbered video markers.

pub mod commands;
pub mod document;
pub mod drawings;
pub mod export;
pub mod fs;
pub mod interaction;
pub mod session;
pub mod settings;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
