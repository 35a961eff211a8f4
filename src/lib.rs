//! Laser Dodge - camera-driven dodging game for an interactive installation
//!
//! Core modules:
//! - `sim`: Gameplay simulation (state machine, beams, particles, difficulty)
//! - `capture`: Threaded camera capture + body segmentation pipeline
//! - `mask`: Binary bitmap type shared by segmentation and collision
//! - `highscores`: Persistent survival-time leaderboard
//! - `settings`: Operator-tunable configuration

pub mod capture;
pub mod highscores;
pub mod mask;
pub mod settings;
pub mod sim;

pub use highscores::Leaderboard;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Internal resolution for game logic and collision (camera resolution).
    /// The display collaborator scales this up to the TV; everything in the
    /// core runs at this fixed size.
    pub const INTERNAL_WIDTH: usize = 640;
    pub const INTERNAL_HEIGHT: usize = 480;

    /// Target tick rate of the main loop
    pub const TARGET_FPS: u32 = 30;
    /// Upper bound on per-tick delta time (prevents simulation explosions
    /// after an OS stall or debugger pause)
    pub const MAX_DT: f64 = 0.1;

    // --- Difficulty curve ---
    // All values are functions of T (survival time in seconds), clamped at
    // their floor. spawn_interval = max(MIN, BASE - T * DECAY), etc.
    pub const SPAWN_BASE_INTERVAL: f32 = 3.5;
    pub const SPAWN_MIN_INTERVAL: f32 = 1.2;
    pub const SPAWN_INTERVAL_DECAY: f32 = 0.015;

    pub const GAP_BASE_SIZE: f32 = 0.40;
    pub const GAP_MIN_SIZE: f32 = 0.18;
    pub const GAP_SHRINK_RATE: f32 = 0.002;

    pub const WARNING_BASE_MS: f32 = 1500.0;
    pub const WARNING_MIN_MS: f32 = 500.0;
    pub const WARNING_DECAY_MS: f32 = 7.5;

    pub const BEAM_ACTIVE_BASE: f32 = 1.8;
    pub const BEAM_ACTIVE_MIN: f32 = 0.7;
    pub const BEAM_ACTIVE_DECAY: f32 = 0.008;

    /// Beam type unlock thresholds (seconds of survival)
    pub const UNLOCK_ANKLE_BREAKER: f32 = 10.0;
    pub const UNLOCK_VERTICAL: f32 = 15.0;
    pub const UNLOCK_HEAD_HUNTER: f32 = 25.0;
    pub const UNLOCK_CROSS: f32 = 30.0;

    /// Core beam width in pixels
    pub const BEAM_CORE_WIDTH: usize = 24;
    /// Fraction of screen covered from the bottom by an ankle breaker
    pub const ANKLE_BREAKER_HEIGHT: f32 = 0.15;
    /// Fraction of screen covered from the top by a head hunter
    pub const HEAD_HUNTER_HEIGHT: f32 = 0.40;

    // --- Anti-camping ---
    /// Pixel movement that resets the camp timer
    pub const CAMPING_THRESHOLD: f32 = 25.0;
    /// Seconds stationary before the warning reticle arms
    pub const CAMPING_TIME: f64 = 3.0;
    /// Seconds of warning before the anti-camp beam fires
    pub const CAMPING_WARNING_TIME: f64 = 2.0;
    /// Short beam warning for the anti-camp type (player already saw the reticle)
    pub const ANTI_CAMP_WARNING: f32 = 0.5;
    pub const ANTI_CAMP_ACTIVE: f32 = 1.5;

    // --- Lives & timing ---
    pub const STARTING_LIVES: u8 = 3;
    pub const INVINCIBILITY_DURATION: f64 = 1.0;
    pub const HIT_FLASH_DURATION: f64 = 0.2;
    pub const COUNTDOWN_DURATION: f64 = 3.0;
    pub const GAMEOVER_DISPLAY_TIME: f64 = 5.0;

    // --- Body detection ---
    /// Minimum mask pixels to consider a body present
    pub const BODY_DETECT_MIN_PIXELS: usize = 500;
    /// Frames without a body before the countdown aborts / hint shows
    pub const BODY_LOST_HINT_FRAMES: u32 = 30;
    /// Seconds without a body during PLAYING before auto game over
    pub const BODY_LOST_GAMEOVER_SEC: f64 = 5.0;

    // --- Segmentation / mask cleaning ---
    /// Confidence threshold for the binary body mask
    pub const SEGMENTATION_THRESHOLD: f32 = 0.5;
    /// Kernel size for the open/close speckle cleanup
    pub const MASK_MORPH_KERNEL: usize = 5;
    /// Erosion applied to the body mask before collision checks. Makes the
    /// hitbox slightly smaller than the visible silhouette.
    pub const COLLISION_ERODE_PX: usize = 5;

    // --- Particles ---
    pub const PARTICLE_MAX_COUNT: usize = 2000;
    pub const PARTICLES_ON_HIT: usize = 150;
    pub const PARTICLES_ON_HIGHSCORE: usize = 500;
    pub const PARTICLE_LIFETIME: f32 = 0.8;
    pub const PARTICLE_DRAG: f32 = 0.96;
    pub const PARTICLE_GRAVITY: f32 = 0.15;
    pub const PARTICLE_SPEED_MIN: f32 = 2.0;
    pub const PARTICLE_SPEED_MAX: f32 = 8.0;
    pub const PARTICLE_SIZE_MIN: f32 = 2.0;
    pub const PARTICLE_SIZE_MAX: f32 = 4.0;

    // --- Leaderboard ---
    pub const LEADERBOARD_FILE: &str = "leaderboard.json";
    pub const LEADERBOARD_MAX_ENTRIES: usize = 10;
}

/// RGB color triple used for beams, particles and HUD feedback
pub type Color = [u8; 3];

/// Beam and feedback colors
pub mod colors {
    use super::Color;

    pub const LASER_HORIZONTAL: Color = [0, 212, 255]; // Electric cyan
    pub const LASER_VERTICAL: Color = [255, 0, 110]; // Hot magenta
    pub const LASER_ANKLE_BREAKER: Color = [255, 100, 0]; // Lava orange
    pub const LASER_HEAD_HUNTER: Color = [170, 0, 255]; // Purple
    pub const LASER_ANTI_CAMP: Color = [255, 30, 30]; // Bright red
    pub const HIT_FLASH: Color = [255, 0, 0];
    pub const HIGHSCORE: Color = [255, 214, 0]; // Gold
}
