//! Fading Module
//!
//! Time-based visibility of drawings around the moment they were placed.
//! Renderers and hit-testing consume the opacity through [`FadeProvider`].

use serde::{Deserialize, Serialize};

use crate::core::Timestamp;

/// Computes an opacity weight for a query time.
pub trait FadeProvider {
    /// Opacity in `[0.0, 1.0]` at `current_time`.
    fn opacity_factor(&self, current_time: Timestamp) -> f64;

    /// Whether the drawing contributes anything at `current_time`.
    fn is_visible(&self, current_time: Timestamp) -> bool {
        self.opacity_factor(current_time) > 0.0
    }
}

/// Fade configuration of a single drawing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FadeDescriptor {
    /// Time at which the drawing is fully opaque
    pub reference_timestamp: Timestamp,
    /// Average timestamp units per frame, used to count frame distance
    pub average_timestamps_per_frame: Timestamp,
    /// Fade out progressively over `fading_frames` instead of disappearing
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ignore time entirely and stay visible
    #[serde(default)]
    pub always_visible: bool,
    /// Number of frames over which the opacity decreases
    #[serde(default = "default_fading_frames")]
    pub fading_frames: u32,
    /// Global multiplier applied to the computed opacity
    #[serde(default = "default_master_factor")]
    pub master_factor: f64,
}

fn default_true() -> bool {
    true
}

fn default_fading_frames() -> u32 {
    20
}

fn default_master_factor() -> f64 {
    1.0
}

impl FadeDescriptor {
    pub fn new(reference_timestamp: Timestamp, average_timestamps_per_frame: Timestamp) -> Self {
        Self {
            reference_timestamp,
            average_timestamps_per_frame,
            enabled: true,
            always_visible: false,
            fading_frames: default_fading_frames(),
            master_factor: default_master_factor(),
        }
    }

    pub fn with_fading_frames(mut self, frames: u32) -> Self {
        self.fading_frames = frames;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_always_visible(mut self, always_visible: bool) -> Self {
        self.always_visible = always_visible;
        self
    }

    /// Whole frames between `current_time` and the reference time.
    fn frame_distance(&self, current_time: Timestamp) -> u64 {
        let delta = current_time.abs_diff(self.reference_timestamp);
        if self.average_timestamps_per_frame <= 0 {
            return delta;
        }
        delta / self.average_timestamps_per_frame as u64
    }

    fn master(&self) -> f64 {
        if self.master_factor.is_finite() {
            self.master_factor.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl FadeProvider for FadeDescriptor {
    fn opacity_factor(&self, current_time: Timestamp) -> f64 {
        if self.always_visible {
            return self.master();
        }

        let distance = self.frame_distance(current_time);
        let opacity = if distance == 0 {
            1.0
        } else if !self.enabled || distance > self.fading_frames as u64 {
            0.0
        } else {
            1.0 - distance as f64 / (self.fading_frames as f64 + 1.0)
        };

        opacity * self.master()
    }
}
