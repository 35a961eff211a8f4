//! Per-tick orchestration
//!
//! One `World::tick` call runs the whole gameplay pipeline for a frame:
//!
//!   1. Update the state machine with the detection flag
//!   2. Apply state-transition side effects (reset, leaderboard submit)
//!   3. Feed the camp detector and fire the anti-camp beam when due
//!   4. Spawn/advance beams from the difficulty curves
//!   5. Collision-test the eroded body mask against active beams
//!   6. Step the particle simulation
//!
//! Events describing what happened are returned so the external HUD and
//! audio collaborators can react without reaching into core state.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::Color;
use crate::consts::*;
use crate::highscores::Leaderboard;
use crate::mask::Mask;

use super::beam::BeamPool;
use super::camp::CampDetector;
use super::particles::ParticleSystem;
use super::state::{GameState, State};

/// Per-tick input derived from the latest frame snapshot
#[derive(Debug, Clone, Copy)]
pub struct TickInput<'a> {
    /// Whether the segmentation pipeline currently sees a body
    pub body_detected: bool,
    /// Centroid of the body mask (None when empty)
    pub centroid: Option<Vec2>,
    /// Eroded body mask used for forgiving collision checks
    pub collision_mask: &'a Mask,
}

/// Something the external HUD/audio collaborators may want to react to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A player stepped into frame; countdown began
    CountdownStarted,
    /// Countdown finished; gameplay is live
    PlayStarted,
    /// The player touched a beam (and survived)
    Hit { point: Vec2, color: Color },
    /// The anti-camp beam was fired at a stationary player
    AntiCampFired { x: usize },
    /// Session ended; leaderboard result attached
    GameOver {
        final_time: f64,
        rank: Option<usize>,
        is_new_highscore: bool,
    },
}

/// Owns all simulation state and drives it once per frame
pub struct World {
    pub state: GameState,
    pub beams: BeamPool,
    pub camp: CampDetector,
    pub particles: ParticleSystem,
    rng: Pcg32,
    width: usize,
    height: usize,
}

impl World {
    pub fn new(width: usize, height: usize, seed: u64, now: f64) -> Self {
        Self {
            state: GameState::new(now),
            beams: BeamPool::new(width, height, seed),
            camp: CampDetector::new(),
            particles: ParticleSystem::with_default_capacity(),
            rng: Pcg32::seed_from_u64(seed ^ 0x9e37_79b9),
            width,
            height,
        }
    }

    /// Advance the whole simulation by one frame.
    ///
    /// `now` is monotonic seconds, `dt` the clamped frame delta. Does
    /// nothing while paused: pause freezes difficulty, spawning, collision,
    /// particles and camp tracking alike.
    pub fn tick(
        &mut self,
        now: f64,
        dt: f32,
        input: TickInput<'_>,
        leaderboard: &mut Leaderboard,
    ) -> Vec<GameEvent> {
        let mut events = Vec::new();

        if self.state.state() == State::Paused {
            return events;
        }

        let prev_state = self.state.state();
        self.state.update(now, input.body_detected);

        // A new player stepped in: clear leftovers from the last session
        if prev_state == State::Idle && self.state.state() == State::Countdown {
            self.beams.reset();
            self.particles.clear();
            events.push(GameEvent::CountdownStarted);
        }
        if prev_state == State::Countdown && self.state.state() == State::Playing {
            events.push(GameEvent::PlayStarted);
        }

        // Anti-camp tracking runs only while gameplay is live
        self.camp.update(now, self.state.in_play(), input.centroid);
        if self.state.in_play()
            && let Some(target) = self.camp.take_fire(now)
        {
            let x = target.x.round().clamp(0.0, (self.width - 1) as f32) as usize;
            self.beams.spawn_anti_camp(x);
            events.push(GameEvent::AntiCampFired { x });
        }

        if self.state.in_play() {
            self.beams.update(dt, self.state.survival_time as f32);

            if !self.state.is_invincible
                && let Some(hit) = self.beams.check_collision(input.collision_mask)
            {
                self.state.register_hit(now);
                self.particles.emit_hit(&mut self.rng, hit.point, hit.color);
                events.push(GameEvent::Hit {
                    point: hit.point,
                    color: hit.color,
                });
            }
        }

        // Session ended this tick (last life or body lost): settle the score
        if self.state.state() == State::GameOver && prev_state != State::GameOver {
            let (rank, is_new_highscore) = leaderboard.submit(self.state.final_time);
            self.state.set_game_over_result(rank, is_new_highscore);
            events.push(GameEvent::GameOver {
                final_time: self.state.final_time,
                rank,
                is_new_highscore,
            });
            if is_new_highscore {
                // Gold celebration burst from screen center
                self.particles.emit(
                    &mut self.rng,
                    Vec2::new(self.width as f32 / 2.0, self.height as f32 / 2.0),
                    PARTICLES_ON_HIGHSCORE,
                    crate::colors::HIGHSCORE,
                    3.0,
                    12.0,
                );
            }
        }

        self.particles.update(dt);

        events
    }
}
