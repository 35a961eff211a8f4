//! Person segmentation backends
//!
//! Exactly one interface: `segment(frame) -> per-pixel confidence`. Two
//! interchangeable implementations sit behind it, chosen once at startup:
//!
//! - [`ProfileBackend`] (production): compares each frame against a
//!   calibrated empty-scene profile recorded at install time. Requires the
//!   profile asset on disk; a missing asset is a fatal startup condition
//!   with a remediation message, never a silent fallback.
//! - [`AdaptiveBackend`] (development): self-calibrating running
//!   background estimate, no asset needed. Selected only when the operator
//!   configuration asks for it.
//!
//! Backend selection happens in [`select_backend`], never per frame.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::SEGMENTATION_THRESHOLD;
use crate::mask::Mask;

use super::device::CaptureDevice;
use super::{ConfigError, DeviceError, Frame, InferenceError};

/// Default location of the calibrated scene profile
pub const PROFILE_PATH: &str = "assets/scene_profile.bin";

/// On-disk profile format version
const PROFILE_VERSION: u32 = 1;

/// Luma levels a pixel must deviate (beyond the noise floor) for full
/// person confidence
const CONFIDENCE_SPREAD: f32 = 48.0;

/// Per-pixel person confidence in [0, 1]
pub struct ConfidenceMap {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl ConfidenceMap {
    /// Binarize at the given confidence threshold
    pub fn threshold(&self, t: f32) -> Mask {
        let data = self
            .data
            .iter()
            .map(|&c| if c > t { 255 } else { 0 })
            .collect();
        Mask::from_raw(self.width, self.height, data)
    }

    /// Binarize at the installation's fixed threshold
    pub fn to_mask(&self) -> Mask {
        self.threshold(SEGMENTATION_THRESHOLD)
    }
}

/// The segmentation backend contract
pub trait SegmentationBackend: Send {
    /// Produce a per-pixel person-confidence map for one frame
    fn segment(&mut self, frame: &Frame) -> Result<ConfidenceMap, InferenceError>;

    fn name(&self) -> &'static str;
}

/// Operator preference for backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// Probe at startup; resolves to the profile backend
    #[default]
    Auto,
    Profile,
    Adaptive,
}

/// Choose and construct the backend once at startup.
///
/// The only fatal path in the core: the profile backend without its asset.
/// Everything after this call recovers locally.
pub fn select_backend(
    pref: BackendPreference,
    profile_path: &Path,
) -> Result<Box<dyn SegmentationBackend>, ConfigError> {
    let backend: Box<dyn SegmentationBackend> = match pref {
        BackendPreference::Adaptive => Box::new(AdaptiveBackend::new()),
        BackendPreference::Auto | BackendPreference::Profile => {
            Box::new(ProfileBackend::load(profile_path)?)
        }
    };
    log::info!("Using segmentation backend: {}", backend.name());
    Ok(backend)
}

/// Rec. 601 luma from an RGB24 pixel
#[inline]
fn luma(r: u8, g: u8, b: u8) -> f32 {
    (r as f32 * 299.0 + g as f32 * 587.0 + b as f32 * 114.0) / 1000.0
}

fn luma_plane(frame: &Frame) -> Vec<f32> {
    frame
        .data
        .chunks_exact(3)
        .map(|px| luma(px[0], px[1], px[2]))
        .collect()
}

/// Calibrated statistics of the empty scene, recorded at install time
#[derive(Debug, Serialize, Deserialize)]
pub struct SceneProfile {
    version: u32,
    pub width: usize,
    pub height: usize,
    /// Mean luma of the empty scene, per pixel
    mean: Vec<f32>,
    /// Luma standard deviation (sensor noise), per pixel
    deviation: Vec<f32>,
}

impl SceneProfile {
    /// Record a profile by averaging `frames` captures of the empty scene
    pub fn record(
        device: &mut dyn CaptureDevice,
        frames: usize,
    ) -> Result<Self, DeviceError> {
        assert!(frames >= 2);
        let first = device.read_frame()?;
        let (width, height) = (first.width, first.height);
        let n = width * height;

        let mut sum = vec![0.0f64; n];
        let mut sum_sq = vec![0.0f64; n];
        let mut accumulate = |frame: &Frame| {
            for (i, l) in luma_plane(frame).into_iter().enumerate() {
                sum[i] += l as f64;
                sum_sq[i] += (l as f64) * (l as f64);
            }
        };
        accumulate(&first);
        for _ in 1..frames {
            accumulate(&device.read_frame()?);
        }

        let count = frames as f64;
        let mut mean = Vec::with_capacity(n);
        let mut deviation = Vec::with_capacity(n);
        for i in 0..n {
            let m = sum[i] / count;
            let var = (sum_sq[i] / count - m * m).max(0.0);
            mean.push(m as f32);
            deviation.push(var.sqrt() as f32);
        }

        Ok(Self {
            version: PROFILE_VERSION,
            width,
            height,
            mean,
            deviation,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::ProfileWrite)?;
        }
        let bytes = bincode::serialize(self)
            .map_err(|e| ConfigError::ProfileCorrupt(e.to_string()))?;
        fs::write(path, bytes).map_err(ConfigError::ProfileWrite)?;
        log::info!("Scene profile written to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|_| ConfigError::ProfileMissing {
            path: path.display().to_string(),
        })?;
        let profile: SceneProfile = bincode::deserialize(&bytes)
            .map_err(|e| ConfigError::ProfileCorrupt(e.to_string()))?;
        if profile.version != PROFILE_VERSION {
            return Err(ConfigError::ProfileCorrupt(format!(
                "version {} (expected {})",
                profile.version, PROFILE_VERSION
            )));
        }
        if profile.mean.len() != profile.width * profile.height
            || profile.deviation.len() != profile.mean.len()
        {
            return Err(ConfigError::ProfileCorrupt("size mismatch".into()));
        }
        Ok(profile)
    }
}

/// Production backend: deviation from the calibrated empty scene
pub struct ProfileBackend {
    profile: SceneProfile,
}

impl ProfileBackend {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let profile = SceneProfile::load(path)?;
        log::info!(
            "Loaded scene profile ({}x{}) from {}",
            profile.width,
            profile.height,
            path.display()
        );
        Ok(Self { profile })
    }

    pub fn from_profile(profile: SceneProfile) -> Self {
        Self { profile }
    }
}

impl SegmentationBackend for ProfileBackend {
    fn segment(&mut self, frame: &Frame) -> Result<ConfidenceMap, InferenceError> {
        if frame.width != self.profile.width || frame.height != self.profile.height {
            return Err(InferenceError::FrameMismatch {
                got: (frame.width, frame.height),
                expected: (self.profile.width, self.profile.height),
            });
        }
        let data = luma_plane(frame)
            .into_iter()
            .enumerate()
            .map(|(i, l)| {
                // Noise floor scales with the calibrated per-pixel jitter
                let noise = self.profile.deviation[i] * 3.0 + 4.0;
                let diff = (l - self.profile.mean[i]).abs();
                ((diff - noise) / CONFIDENCE_SPREAD).clamp(0.0, 1.0)
            })
            .collect();
        Ok(ConfidenceMap {
            width: frame.width,
            height: frame.height,
            data,
        })
    }

    fn name(&self) -> &'static str {
        "profile"
    }
}

/// Development backend: running background estimate, no asset required
pub struct AdaptiveBackend {
    background: Option<Vec<f32>>,
    width: usize,
    height: usize,
}

/// Fixed noise floor while no per-pixel statistics exist
const ADAPTIVE_NOISE: f32 = 12.0;
/// Background update rate for pixels that look like background
const ADAPT_FAST: f32 = 0.05;
/// Update rate for pixels that look like the player (avoids burning the
/// silhouette into the background while still recovering from scene moves)
const ADAPT_SLOW: f32 = 0.002;

impl AdaptiveBackend {
    pub fn new() -> Self {
        Self {
            background: None,
            width: 0,
            height: 0,
        }
    }
}

impl Default for AdaptiveBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentationBackend for AdaptiveBackend {
    fn segment(&mut self, frame: &Frame) -> Result<ConfidenceMap, InferenceError> {
        let plane = luma_plane(frame);
        let Some(background) = self.background.as_mut() else {
            // First frame seeds the background; report nothing yet
            self.background = Some(plane);
            self.width = frame.width;
            self.height = frame.height;
            return Ok(ConfidenceMap {
                width: frame.width,
                height: frame.height,
                data: vec![0.0; frame.width * frame.height],
            });
        };
        if frame.width != self.width || frame.height != self.height {
            return Err(InferenceError::FrameMismatch {
                got: (frame.width, frame.height),
                expected: (self.width, self.height),
            });
        }

        let mut data = Vec::with_capacity(plane.len());
        for (bg, l) in background.iter_mut().zip(plane) {
            let diff = (l - *bg).abs();
            let conf = ((diff - ADAPTIVE_NOISE) / CONFIDENCE_SPREAD).clamp(0.0, 1.0);
            let alpha = if conf >= SEGMENTATION_THRESHOLD {
                ADAPT_SLOW
            } else {
                ADAPT_FAST
            };
            *bg += (l - *bg) * alpha;
            data.push(conf);
        }
        Ok(ConfidenceMap {
            width: frame.width,
            height: frame.height,
            data,
        })
    }

    fn name(&self) -> &'static str {
        "adaptive"
    }
}
