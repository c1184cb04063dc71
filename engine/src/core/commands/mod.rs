//! Edit Command System
//!
//! Marker edits made during a session run through Commands so they can be
//! undone and redone.

mod executor;
mod marker;
mod traits;

pub use executor::*;
pub use marker::*;
pub use traits::*;
