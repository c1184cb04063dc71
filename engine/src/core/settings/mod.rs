//! Settings Persistence
//!
//! Overlay settings stored as JSON with:
//! - Atomic writes (temp file + swap)
//! - Tolerant loading: unknown or out-of-range values are normalized
//! - An advisory lock file so two editors do not write concurrently
//!
//! Storage location: {config_dir}/vidmark/settings.json

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::{
    drawings::{FadeDescriptor, MarkerStyle},
    fs::{atomic_write_json_pretty, read_json},
    Color, CoreError, CoreResult,
};

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Lock file name (advisory lock to prevent concurrent writers)
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Overlay engine settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySettings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub markers: MarkerSettings,

    #[serde(default)]
    pub fading: FadingSettings,

    #[serde(default)]
    pub history: HistorySettings,

    #[serde(default)]
    pub export: ExportSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            markers: MarkerSettings::default(),
            fading: FadingSettings::default(),
            history: HistorySettings::default(),
            export: ExportSettings::default(),
        }
    }
}

impl OverlaySettings {
    /// Clamps every value into its valid range instead of rejecting the file.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.markers.font_size = clamp_f64(self.markers.font_size, 6.0, 128.0);
        self.markers.padding = clamp_f64(self.markers.padding, 0.0, 32.0);
        if Color::try_from_hex(&self.markers.background_color).is_err() {
            self.markers.background_color = default_background_color();
        }
        if Color::try_from_hex(&self.markers.text_color).is_err() {
            self.markers.text_color = default_text_color();
        }

        self.fading.fading_frames = self.fading.fading_frames.min(1000);
        self.fading.opacity = clamp_f64(self.fading.opacity, 0.0, 1.0);

        self.history.max_undo_steps = self.history.max_undo_steps.clamp(1, 1000);

        self.export.decimal_places = self.export.decimal_places.min(6);
    }
}

fn clamp_f64(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return min;
    }
    value.clamp(min, max)
}

/// Appearance of numbered markers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarkerSettings {
    /// Label font size in image pixels
    #[serde(default = "default_font_size")]
    pub font_size: f64,

    /// Space between the label text and its background edge
    #[serde(default = "default_padding")]
    pub padding: f64,

    /// Background color (`#RRGGBB` or `#RRGGBBAA`)
    #[serde(default = "default_background_color")]
    pub background_color: String,

    /// Text color (`#RRGGBB` or `#RRGGBBAA`)
    #[serde(default = "default_text_color")]
    pub text_color: String,
}

fn default_font_size() -> f64 {
    16.0
}

fn default_padding() -> f64 {
    4.0
}

fn default_background_color() -> String {
    "#000000C0".to_string()
}

fn default_text_color() -> String {
    "#FFFFFF".to_string()
}

impl Default for MarkerSettings {
    fn default() -> Self {
        Self {
            font_size: default_font_size(),
            padding: default_padding(),
            background_color: default_background_color(),
            text_color: default_text_color(),
        }
    }
}

impl MarkerSettings {
    pub fn style(&self) -> MarkerStyle {
        let defaults = MarkerStyle::default();
        MarkerStyle {
            font_size: self.font_size,
            padding: self.padding,
            background: Color::from_hex_or(&self.background_color, defaults.background),
            foreground: Color::from_hex_or(&self.text_color, defaults.foreground),
        }
    }
}

/// Time-based visibility of newly placed markers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FadingSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_fading_frames")]
    pub fading_frames: u32,

    #[serde(default)]
    pub always_visible: bool,

    /// Global opacity multiplier
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_true() -> bool {
    true
}

fn default_fading_frames() -> u32 {
    20
}

fn default_opacity() -> f64 {
    1.0
}

impl Default for FadingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            fading_frames: default_fading_frames(),
            always_visible: false,
            opacity: default_opacity(),
        }
    }
}

impl FadingSettings {
    /// Template descriptor; reference time and frame interval are filled in
    /// per marker.
    pub fn profile(&self) -> FadeDescriptor {
        let mut fade = FadeDescriptor::new(0, 1)
            .with_enabled(self.enabled)
            .with_fading_frames(self.fading_frames)
            .with_always_visible(self.always_visible);
        fade.master_factor = self.opacity;
        fade
    }
}

/// Undo/redo history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistorySettings {
    #[serde(default = "default_max_undo_steps")]
    pub max_undo_steps: usize,
}

fn default_max_undo_steps() -> usize {
    100
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_undo_steps: default_max_undo_steps(),
        }
    }
}

/// Text export formatting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    #[serde(default = "default_true")]
    pub include_header: bool,

    /// Decimal places for coordinates
    #[serde(default = "default_decimal_places")]
    pub decimal_places: usize,
}

fn default_decimal_places() -> usize {
    2
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            include_header: true,
            decimal_places: default_decimal_places(),
        }
    }
}

/// Loads, saves and resets the settings file
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Creates a manager storing settings in `config_dir`
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            settings_path: config_dir.join(SETTINGS_FILE),
        }
    }

    /// Manager for the platform config directory, if one exists
    pub fn for_user() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join("vidmark")))
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    fn lock_path(&self) -> PathBuf {
        self.settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SETTINGS_LOCK_FILE)
    }

    fn with_lock<T>(&self, exclusive: bool, op: impl FnOnce() -> CoreResult<T>) -> CoreResult<T> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file)?;
        } else {
            fs2::FileExt::lock_shared(&lock_file)?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    /// Loads settings, falling back to defaults when missing or unreadable
    pub fn load(&self) -> OverlaySettings {
        let result = self.with_lock(false, || {
            if !self.settings_path.exists() {
                info!("Settings file not found, using defaults");
                return Ok(OverlaySettings::default());
            }

            let mut settings: OverlaySettings = read_json(&self.settings_path)?;
            if settings.version < SETTINGS_VERSION {
                info!(
                    "Migrating settings from version {} to {}",
                    settings.version, SETTINGS_VERSION
                );
                settings = migrate(settings);
            }
            settings.normalize();
            Ok(settings)
        });

        match result {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                OverlaySettings::default()
            }
        }
    }

    /// Normalizes and persists `settings`; returns what was written
    pub fn save(&self, settings: &OverlaySettings) -> CoreResult<OverlaySettings> {
        self.with_lock(true, || {
            let mut normalized = settings.clone();
            normalized.normalize();
            atomic_write_json_pretty(&self.settings_path, &normalized)?;
            info!("Settings saved to {:?}", self.settings_path);
            Ok(normalized)
        })
    }

    /// Deletes the settings file and returns defaults
    pub fn reset(&self) -> CoreResult<OverlaySettings> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path).map_err(CoreError::IoError)?;
                info!("Settings file deleted");
            }
            Ok(OverlaySettings::default())
        })
    }
}

fn migrate(mut settings: OverlaySettings) -> OverlaySettings {
    settings.version = SETTINGS_VERSION;
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_normalized() {
        let mut settings = OverlaySettings::default();
        let before = settings.clone();
        settings.normalize();
        assert_eq!(settings, before);
    }

    #[test]
    fn test_normalize_clamps_values() {
        let mut settings = OverlaySettings::default();
        settings.markers.font_size = 1000.0;
        settings.markers.padding = f64::NAN;
        settings.markers.background_color = "blue".to_string();
        settings.fading.opacity = 3.0;
        settings.history.max_undo_steps = 0;
        settings.export.decimal_places = 12;
        settings.normalize();

        assert_eq!(settings.markers.font_size, 128.0);
        assert_eq!(settings.markers.padding, 0.0);
        assert_eq!(settings.markers.background_color, "#000000C0");
        assert_eq!(settings.fading.opacity, 1.0);
        assert_eq!(settings.history.max_undo_steps, 1);
        assert_eq!(settings.export.decimal_places, 6);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"markers": {"fontSize": 24.0}}"#;
        let settings: OverlaySettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.markers.font_size, 24.0);
        assert_eq!(settings.markers.padding, 4.0);
        assert_eq!(settings.fading, FadingSettings::default());
        assert_eq!(settings.version, SETTINGS_VERSION);
    }

    #[test]
    fn test_marker_style_from_settings() {
        let settings = MarkerSettings {
            text_color: "#FF0000".to_string(),
            ..MarkerSettings::default()
        };
        let style = settings.style();
        assert_eq!(style.foreground, Color::rgb(255, 0, 0));
        assert_eq!(style.background, Color::rgba(0, 0, 0, 0xC0));
    }

    #[test]
    fn test_fade_profile_from_settings() {
        let settings = FadingSettings {
            enabled: false,
            fading_frames: 5,
            always_visible: true,
            opacity: 0.5,
        };
        let profile = settings.profile();
        assert!(!profile.enabled);
        assert_eq!(profile.fading_frames, 5);
        assert!(profile.always_visible);
        assert_eq!(profile.master_factor, 0.5);
    }

    #[test]
    fn test_load_missing_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().to_path_buf());
        assert_eq!(manager.load(), OverlaySettings::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().join("config"));

        let mut settings = OverlaySettings::default();
        settings.markers.font_size = 22.0;
        settings.history.max_undo_steps = 5000;

        let saved = manager.save(&settings).unwrap();
        assert_eq!(saved.history.max_undo_steps, 1000);

        let loaded = manager.load();
        assert_eq!(loaded, saved);
    }

    #[test]
    fn test_corrupted_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().to_path_buf());
        fs::write(manager.settings_path(), "{ not json").unwrap();
        assert_eq!(manager.load(), OverlaySettings::default());
    }

    #[test]
    fn test_reset_deletes_file() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().to_path_buf());
        manager.save(&OverlaySettings::default()).unwrap();
        assert!(manager.settings_path().exists());

        let reset = manager.reset().unwrap();
        assert_eq!(reset, OverlaySettings::default());
        assert!(!manager.settings_path().exists());
    }
}
