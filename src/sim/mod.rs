//! Gameplay simulation module
//!
//! All per-tick game logic lives here. This module is free of camera and
//! platform dependencies: it consumes frame snapshots produced by `capture`
//! and is driven by the fixed-rate loop in `main`.

pub mod beam;
pub mod camp;
pub mod difficulty;
pub mod particles;
pub mod state;
pub mod tick;

pub use beam::{Beam, BeamKind, BeamPhase, BeamPool, HitInfo};
pub use camp::CampDetector;
pub use difficulty::Tier;
pub use particles::ParticleSystem;
pub use state::{GameState, State};
pub use tick::{GameEvent, TickInput, World};
