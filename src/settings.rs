//! Operator settings
//!
//! Venue-specific tunables the operator may adjust without touching game
//! logic. Persisted as `settings.json` next to the binary; a missing or
//! unreadable file silently falls back to defaults so a wiped disk never
//! blocks the installation from starting.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::capture::BackendPreference;

/// Default settings file location
pub const SETTINGS_FILE: &str = "settings.json";

/// Operator-facing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Camera ===
    /// Capture source handed to the capture subprocess
    pub camera_device: String,
    /// Flip the image horizontally for the mirror effect
    pub camera_mirror: bool,

    // === Segmentation ===
    /// Backend selection; `auto` resolves at startup
    pub segmentation_backend: BackendPreference,
    /// Path of the calibrated scene profile asset
    pub scene_profile_path: String,
    /// Frames averaged by `--calibrate`
    pub calibration_frames: usize,

    // === Session ===
    /// RNG seed override for reproducible spawn sequences (None = time-based)
    pub seed: Option<u64>,

    // === Audio (passed through to the audio collaborator) ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,

    // === Debug ===
    /// Show the FPS counter
    pub show_fps: bool,
    /// Show the raw mask / collision overlay
    pub show_debug_mask: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            camera_device: "/dev/video0".to_string(),
            camera_mirror: true,
            segmentation_backend: BackendPreference::Auto,
            scene_profile_path: crate::capture::segment::PROFILE_PATH.to_string(),
            calibration_frames: 90,
            seed: None,
            master_volume: 0.7,
            show_fps: false,
            show_debug_mask: false,
        }
    }
}

impl Settings {
    /// Load from the default file, falling back to defaults
    pub fn load_default() -> Self {
        Self::load(SETTINGS_FILE)
    }

    /// Load from the given path; any failure yields defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(err) => {
                    log::warn!("Settings file is invalid ({err}); using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No settings file; using defaults");
                Self::default()
            }
        }
    }

    /// Persist to the given path, best-effort
    pub fn save<P: AsRef<Path>>(&self, path: P) {
        let path = path.as_ref();
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(err) = fs::write(path, json) {
                    log::warn!("Settings save failed: {err}");
                }
            }
            Err(err) => log::warn!("Settings serialize failed: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let s = Settings::load("/nonexistent/settings.json");
        assert_eq!(s.camera_device, "/dev/video0");
        assert!(s.camera_mirror);
        assert_eq!(s.segmentation_backend, BackendPreference::Auto);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = std::env::temp_dir().join(format!(
            "laser-dodge-settings-{}.json",
            std::process::id()
        ));
        fs::write(&path, r#"{"camera_mirror": false, "segmentation_backend": "adaptive"}"#)
            .unwrap();
        let s = Settings::load(&path);
        assert!(!s.camera_mirror);
        assert_eq!(s.segmentation_backend, BackendPreference::Adaptive);
        // Unspecified keys keep their defaults
        assert_eq!(s.calibration_frames, 90);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "laser-dodge-settings-rt-{}.json",
            std::process::id()
        ));
        let mut s = Settings::default();
        s.show_fps = true;
        s.seed = Some(1234);
        s.save(&path);
        let loaded = Settings::load(&path);
        assert!(loaded.show_fps);
        assert_eq!(loaded.seed, Some(1234));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let path = std::env::temp_dir().join(format!(
            "laser-dodge-settings-bad-{}.json",
            std::process::id()
        ));
        fs::write(&path, "not json at all").unwrap();
        let s = Settings::load(&path);
        assert_eq!(s.camera_device, "/dev/video0");
        let _ = fs::remove_file(&path);
    }
}
