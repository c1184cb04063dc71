//! Drawings Module
//!
//! Overlay elements drawn on top of the video frame and manipulated with the
//! pointer. Every element implements [`Drawable`]; composites that manage many
//! same-kind items additionally implement [`MultiDrawing`].
//!
//! # Example
//!
//! ```rust,ignore
//! use vidmark_lib::core::drawings::{Drawable, MarkerSet, render::DisplayList};
//!
//! let mut markers = MarkerSet::default();
//! markers.add_new(Point2D::new(120.0, 80.0), 4000, 40);
//!
//! let mut list = DisplayList::new();
//! markers.draw(&mut list, &CoordinateTransform::identity(), false, 4000);
//! ```

use std::any::Any;

use crate::core::{CoreResult, Point2D, Timestamp};

pub mod fading;
pub mod marker_set;
pub mod numbered_marker;
pub mod render;

pub use fading::{FadeDescriptor, FadeProvider};
pub use marker_set::{FragmentElement, MarkerSet};
pub use numbered_marker::{MarkerRecord, MarkerStyle, NumberedMarker};
pub use render::{CoordinateTransform, DisplayList, Primitive, RenderSurface};

// =============================================================================
// Hit Testing
// =============================================================================

/// Outcome of a hit test
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitResult {
    /// The point is outside the drawing
    Miss,
    /// The drawing as a whole was hit
    Body,
    /// A manipulation handle was hit (ids start at 1)
    Handle(u32),
}

impl HitResult {
    pub fn is_hit(&self) -> bool {
        !matches!(self, Self::Miss)
    }
}

/// Keyboard modifiers held while dragging
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModifierKeys {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
}

impl ModifierKeys {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }
}

// =============================================================================
// Capabilities
// =============================================================================

/// Optional per-drawing behaviors the host may offer in context menus
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawingCapabilities {
    pub configure_color: bool,
    pub configure_size: bool,
    pub configure_fading: bool,
    pub track: bool,
}

impl DrawingCapabilities {
    pub const NONE: Self = Self {
        configure_color: false,
        configure_size: false,
        configure_fading: false,
        track: false,
    };

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

// =============================================================================
// Drawable Contract
// =============================================================================

/// Contract every overlay element satisfies.
///
/// Coordinates passed to `hit_test`, `move_handle` and `move_drawing` are in
/// original image space; `draw` maps them through the transform.
pub trait Drawable {
    /// Fade configuration used for time-based opacity.
    fn fading(&self) -> CoreResult<&FadeDescriptor>;

    /// Replaces the fade configuration.
    ///
    /// Elements that cannot be faded from outside return
    /// [`CoreError::NotSupported`](crate::core::CoreError::NotSupported).
    fn set_fading(&mut self, fading: FadeDescriptor) -> CoreResult<()>;

    fn capabilities(&self) -> DrawingCapabilities {
        DrawingCapabilities::NONE
    }

    /// Renders into `surface`. Must not change the element.
    fn draw(
        &self,
        surface: &mut dyn RenderSurface,
        transform: &CoordinateTransform,
        selected: bool,
        current_time: Timestamp,
    );

    /// Evaluates whether `point` lands on the element at `current_time`.
    fn hit_test(&mut self, point: Point2D, current_time: Timestamp) -> HitResult;

    /// Moves handle `handle` to `point`. Unknown handles are ignored.
    fn move_handle(&mut self, point: Point2D, handle: u32);

    /// Translates the whole element.
    fn move_drawing(&mut self, dx: f64, dy: f64, modifiers: ModifierKeys);

    /// Human readable label for UI chrome
    fn display_name(&self) -> String;
}

/// A drawing made of many same-kind items.
///
/// Payloads are type-erased so the undo/redo layer can replay items without
/// knowing the concrete kind. Payloads of the wrong type are ignored.
pub trait MultiDrawing: Drawable {
    fn count(&self) -> usize;

    /// A copy of the currently selected item, if any
    fn selected_item(&self) -> Option<Box<dyn Any>>;

    /// Re-inserts a previously recorded item.
    ///
    /// Items that would collide with an existing one (for markers: a value
    /// already in use, or zero) are ignored.
    fn add_item(&mut self, item: Box<dyn Any>);

    /// Removes the item matching `item`.
    fn remove_item(&mut self, item: &dyn Any);

    fn clear(&mut self);
}
