//! Numbered Marker
//!
//! A single integer label placed on the image at a given video time.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::core::{
    drawings::{
        CoordinateTransform, Drawable, FadeDescriptor, FadeProvider, HitResult, ModifierKeys,
        Primitive, RenderSurface,
    },
    Color, CoreResult, MarkerId, Point2D, Rect, Timestamp,
};

/// The only manipulation handle of a marker: its anchor point.
pub const LABEL_HANDLE: u32 = 1;

/// Approximate glyph width relative to the font size, for label sizing.
const DIGIT_WIDTH_RATIO: f64 = 0.6;

/// Generates a new unique marker ID
fn generate_marker_id() -> MarkerId {
    Ulid::new().to_string()
}

// =============================================================================
// Style
// =============================================================================

/// Visual style of a marker label, in image-space units
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerStyle {
    pub font_size: f64,
    pub padding: f64,
    pub background: Color,
    pub foreground: Color,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            padding: 4.0,
            background: Color::rgba(0, 0, 0, 192),
            foreground: Color::white(),
        }
    }
}

// =============================================================================
// Persisted Form
// =============================================================================

/// Serialized payload of a marker inside a document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerRecord {
    pub value: u32,
    pub position: Point2D,
    pub placed_at: Timestamp,
    pub frame_interval: Timestamp,
}

impl MarkerRecord {
    pub fn validate(&self) -> Result<(), String> {
        if self.value == 0 {
            return Err("Marker value must be at least 1".to_string());
        }
        if !self.position.x.is_finite() || !self.position.y.is_finite() {
            return Err(format!(
                "Marker {} has a non-finite position ({}, {})",
                self.value, self.position.x, self.position.y
            ));
        }
        if self.frame_interval < 0 {
            return Err(format!(
                "Marker {} has a negative frame interval: {}",
                self.value, self.frame_interval
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Numbered Marker
// =============================================================================

/// One placed, timestamped label.
///
/// `value` is fixed for the lifetime of the marker; renumbering means removing
/// the marker and adding a new one.
#[derive(Clone, Debug, PartialEq)]
pub struct NumberedMarker {
    id: MarkerId,
    value: u32,
    position: Point2D,
    placed_at: Timestamp,
    frame_interval: Timestamp,
    fading: FadeDescriptor,
    style: MarkerStyle,
}

impl NumberedMarker {
    pub fn new(
        value: u32,
        position: Point2D,
        placed_at: Timestamp,
        frame_interval: Timestamp,
    ) -> Self {
        Self {
            id: generate_marker_id(),
            value,
            position,
            placed_at,
            frame_interval,
            fading: FadeDescriptor::new(placed_at, frame_interval),
            style: MarkerStyle::default(),
        }
    }

    /// Rebuilds a marker from its persisted form with a fresh identity.
    pub fn from_record(record: &MarkerRecord) -> Self {
        Self::new(
            record.value,
            record.position,
            record.placed_at,
            record.frame_interval,
        )
    }

    pub fn to_record(&self) -> MarkerRecord {
        MarkerRecord {
            value: self.value,
            position: self.position,
            placed_at: self.placed_at,
            frame_interval: self.frame_interval,
        }
    }

    pub fn with_style(mut self, style: MarkerStyle) -> Self {
        self.style = style;
        self
    }

    /// Adopts the fade behavior of `template` while keeping this marker's
    /// reference time and frame interval.
    pub fn with_fade_profile(mut self, template: &FadeDescriptor) -> Self {
        self.fading = FadeDescriptor {
            reference_timestamp: self.placed_at,
            average_timestamps_per_frame: self.frame_interval,
            ..template.clone()
        };
        self
    }

    pub fn id(&self) -> &MarkerId {
        &self.id
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn position(&self) -> Point2D {
        self.position
    }

    pub fn placed_at(&self) -> Timestamp {
        self.placed_at
    }

    pub fn frame_interval(&self) -> Timestamp {
        self.frame_interval
    }

    pub fn style(&self) -> &MarkerStyle {
        &self.style
    }

    pub fn label(&self) -> String {
        self.value.to_string()
    }

    /// Label background box in image space, centered on the position
    pub fn label_rect(&self) -> Rect {
        let digits = self.label().len() as f64;
        let text_width = digits * self.style.font_size * DIGIT_WIDTH_RATIO;
        let width = text_width.max(self.style.font_size) + 2.0 * self.style.padding;
        let height = self.style.font_size + 2.0 * self.style.padding;
        Rect::centered_at(self.position, width, height)
    }

    pub fn is_visible(&self, current_time: Timestamp) -> bool {
        self.fading.is_visible(current_time)
    }
}

impl Drawable for NumberedMarker {
    fn fading(&self) -> CoreResult<&FadeDescriptor> {
        Ok(&self.fading)
    }

    fn set_fading(&mut self, fading: FadeDescriptor) -> CoreResult<()> {
        self.fading = fading;
        Ok(())
    }

    fn draw(
        &self,
        surface: &mut dyn RenderSurface,
        transform: &CoordinateTransform,
        selected: bool,
        current_time: Timestamp,
    ) {
        let opacity = self.fading.opacity_factor(current_time);
        if opacity <= 0.0 {
            return;
        }

        let rect = transform.rect_to_screen(self.label_rect());
        let radius = rect.height / 2.0;

        surface.push(Primitive::FillRoundedRect {
            rect,
            radius,
            color: self.style.background.faded(opacity),
        });

        if selected {
            surface.push(Primitive::StrokeRoundedRect {
                rect,
                radius,
                width: 1.0,
                color: self.style.foreground.faded(opacity),
            });
        }

        surface.push(Primitive::Text {
            anchor: rect.center(),
            text: self.label(),
            font_size: transform.scale_length(self.style.font_size),
            color: self.style.foreground.faded(opacity),
        });
    }

    fn hit_test(&mut self, point: Point2D, current_time: Timestamp) -> HitResult {
        if self.is_visible(current_time) && self.label_rect().contains(point) {
            HitResult::Body
        } else {
            HitResult::Miss
        }
    }

    fn move_handle(&mut self, point: Point2D, handle: u32) {
        if handle == LABEL_HANDLE {
            self.position = point;
        }
    }

    // Labels move freely; modifiers carry no constraint.
    fn move_drawing(&mut self, dx: f64, dy: f64, _modifiers: ModifierKeys) {
        self.position = self.position.translated(dx, dy);
    }

    fn display_name(&self) -> String {
        format!("Marker {}", self.value)
    }
}
