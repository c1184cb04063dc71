//! Render Contract
//!
//! Drawings never talk to a graphics backend directly. They emit [`Primitive`]s
//! into a [`RenderSurface`] using a [`CoordinateTransform`] from image space to
//! screen space.

use crate::core::{Color, Point2D, Rect};

// =============================================================================
// Coordinate Transform
// =============================================================================

/// Maps original-image coordinates to the on-screen canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateTransform {
    /// Scale between the canvas and the original image
    pub stretch: f64,
    /// Top-left corner of the zoom window in image coordinates
    pub zoom_origin: Point2D,
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl CoordinateTransform {
    pub fn new(stretch: f64, zoom_origin: Point2D) -> Self {
        let stretch = if stretch.is_finite() && stretch > 0.0 {
            stretch
        } else {
            1.0
        };
        Self {
            stretch,
            zoom_origin,
        }
    }

    pub fn identity() -> Self {
        Self {
            stretch: 1.0,
            zoom_origin: Point2D::default(),
        }
    }

    pub fn to_screen(&self, point: Point2D) -> Point2D {
        Point2D::new(
            (point.x - self.zoom_origin.x) * self.stretch,
            (point.y - self.zoom_origin.y) * self.stretch,
        )
    }

    pub fn to_image(&self, point: Point2D) -> Point2D {
        Point2D::new(
            point.x / self.stretch + self.zoom_origin.x,
            point.y / self.stretch + self.zoom_origin.y,
        )
    }

    pub fn scale_length(&self, length: f64) -> f64 {
        length * self.stretch
    }

    pub fn rect_to_screen(&self, rect: Rect) -> Rect {
        let origin = self.to_screen(Point2D::new(rect.x, rect.y));
        Rect::new(
            origin.x,
            origin.y,
            self.scale_length(rect.width),
            self.scale_length(rect.height),
        )
    }
}

// =============================================================================
// Primitives
// =============================================================================

/// A single screen-space drawing instruction
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    FillRoundedRect {
        rect: Rect,
        radius: f64,
        color: Color,
    },
    StrokeRoundedRect {
        rect: Rect,
        radius: f64,
        width: f64,
        color: Color,
    },
    Text {
        /// Center of the text run
        anchor: Point2D,
        text: String,
        font_size: f64,
        color: Color,
    },
    Line {
        from: Point2D,
        to: Point2D,
        width: f64,
        color: Color,
    },
    FillEllipse {
        center: Point2D,
        radius_x: f64,
        radius_y: f64,
        color: Color,
    },
}

/// Write-only sink for primitives.
pub trait RenderSurface {
    fn push(&mut self, primitive: Primitive);
}

/// Recording surface; hosts rasterize it after the overlay pass.
#[derive(Clone, Debug, Default)]
pub struct DisplayList {
    primitives: Vec<Primitive>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn clear(&mut self) {
        self.primitives.clear();
    }

    /// Text of every text primitive, in emission order
    pub fn texts(&self) -> Vec<&str> {
        self.primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl RenderSurface for DisplayList {
    fn push(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }
}
