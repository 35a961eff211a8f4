//! Game session state machine
//!
//! States: IDLE -> COUNTDOWN -> PLAYING <-> HIT -> GAME_OVER -> IDLE,
//! plus PAUSED (operator toggle, reachable from any state).
//!
//! Every state records when it was entered, so time-based transitions
//! (countdown, invincibility, game-over display) all derive from a single
//! reference point. All methods take `now` in seconds from a monotonic
//! clock; nothing here reads wall time directly, which keeps transitions
//! testable.

use crate::consts::*;

use super::difficulty::Tier;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Attract screen, waiting for a player to step into frame
    Idle,
    /// 3-2-1 before gameplay starts
    Countdown,
    /// Active gameplay
    Playing,
    /// Brief cosmetic sub-state of PLAYING after a collision
    Hit,
    /// Score display, then back to IDLE
    GameOver,
    /// Operator pause
    Paused,
}

/// Manages the current state, transitions and per-state timing
#[derive(Debug)]
pub struct GameState {
    state: State,
    /// When the current state was entered
    entered_at: f64,

    pub lives: u8,
    /// Seconds survived in the current session; monotonic while
    /// PLAYING/HIT, frozen the instant GAME_OVER is entered
    pub survival_time: f64,
    play_start_time: f64,
    pub is_invincible: bool,
    invincible_until: f64,

    /// When the body was last lost during gameplay
    body_lost_since: Option<f64>,
    /// Consecutive frames without a body (countdown abort / HUD hint)
    body_lost_frames: u32,

    /// Result of the finished session, set when entering GAME_OVER
    pub final_time: f64,
    pub is_new_highscore: bool,
    pub leaderboard_rank: Option<usize>,

    /// State to restore when the operator unpauses
    paused_from: Option<State>,
    /// Operator difficulty override (1-4); None = auto from survival time
    forced_difficulty: Option<u8>,
}

impl GameState {
    pub fn new(now: f64) -> Self {
        Self {
            state: State::Idle,
            entered_at: now,
            lives: STARTING_LIVES,
            survival_time: 0.0,
            play_start_time: 0.0,
            is_invincible: false,
            invincible_until: 0.0,
            body_lost_since: None,
            body_lost_frames: 0,
            final_time: 0.0,
            is_new_highscore: false,
            leaderboard_rank: None,
            paused_from: None,
            forced_difficulty: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Seconds since the current state was entered
    pub fn time_in_state(&self, now: f64) -> f64 {
        now - self.entered_at
    }

    /// True while gameplay is live (beams spawn, collisions count)
    pub fn in_play(&self) -> bool {
        matches!(self.state, State::Playing | State::Hit)
    }

    /// Number to display during COUNTDOWN (3, 2, 1), 0 once finished
    pub fn countdown_number(&self, now: f64) -> u32 {
        if self.state != State::Countdown {
            return 0;
        }
        let remaining = COUNTDOWN_DURATION - self.time_in_state(now);
        if remaining <= 0.0 {
            0
        } else {
            remaining as u32 + 1
        }
    }

    /// Difficulty tier for the HUD: operator override, else survival time
    pub fn tier(&self) -> Tier {
        match self.forced_difficulty {
            Some(level) => Tier::from_forced(level),
            None => Tier::from_survival_time(self.survival_time),
        }
    }

    pub fn forced_difficulty(&self) -> Option<u8> {
        self.forced_difficulty
    }

    /// Operator setter: force a tier (1-4 clamped) or None for auto
    pub fn set_forced_difficulty(&mut self, level: Option<u8>) {
        self.forced_difficulty = level.map(|l| l.clamp(1, 4));
    }

    /// Consecutive detection-less frames, for the HUD "step closer" hint
    pub fn body_lost_frames(&self) -> u32 {
        self.body_lost_frames
    }

    fn enter(&mut self, state: State, now: f64) {
        self.state = state;
        self.entered_at = now;
    }

    /// Advance all automatic transitions. Called once per tick; never
    /// called while paused (pause freezes logical time).
    pub fn update(&mut self, now: f64, body_detected: bool) {
        if self.is_invincible && now >= self.invincible_until {
            self.is_invincible = false;
        }

        match self.state {
            State::Idle => {
                if body_detected {
                    self.start_countdown(now);
                }
            }
            State::Countdown => {
                if self.time_in_state(now) >= COUNTDOWN_DURATION {
                    self.start_playing(now);
                } else if !body_detected {
                    // Player walked away mid-countdown: abort to attract
                    self.body_lost_frames += 1;
                    if self.body_lost_frames > BODY_LOST_HINT_FRAMES {
                        self.enter(State::Idle, now);
                    }
                } else {
                    self.body_lost_frames = 0;
                }
            }
            State::Playing => {
                self.survival_time = now - self.play_start_time;
                self.track_body(now, body_detected);
            }
            State::Hit => {
                // HIT is cosmetic; the survival clock keeps running
                self.survival_time = now - self.play_start_time;
                self.track_body(now, body_detected);
                if self.state == State::Hit && self.time_in_state(now) >= HIT_FLASH_DURATION {
                    self.enter(State::Playing, now);
                }
            }
            State::GameOver => {
                if self.time_in_state(now) >= GAMEOVER_DISPLAY_TIME {
                    self.enter(State::Idle, now);
                }
            }
            State::Paused => {}
        }
    }

    fn track_body(&mut self, now: f64, body_detected: bool) {
        if body_detected {
            self.body_lost_since = None;
            self.body_lost_frames = 0;
            return;
        }
        self.body_lost_frames += 1;
        match self.body_lost_since {
            None => self.body_lost_since = Some(now),
            Some(since) => {
                if now - since > BODY_LOST_GAMEOVER_SEC {
                    // Player left the frame: graceful game over
                    self.trigger_game_over(now);
                }
            }
        }
    }

    /// Register a collision. No-op while invincible (at most one life lost
    /// per invincibility window). Returns false when the session ended.
    pub fn register_hit(&mut self, now: f64) -> bool {
        if self.is_invincible {
            return true;
        }

        self.lives = self.lives.saturating_sub(1);
        self.is_invincible = true;
        self.invincible_until = now + INVINCIBILITY_DURATION;

        if self.lives == 0 {
            self.trigger_game_over(now);
            false
        } else {
            self.enter(State::Hit, now);
            true
        }
    }

    /// Operator pause toggle: remembers and restores the prior state
    pub fn toggle_pause(&mut self, now: f64) {
        if self.state == State::Paused {
            if let Some(prior) = self.paused_from.take() {
                // Resume where we left off, accepting minor timer drift
                self.enter(prior, now);
            }
        } else {
            self.paused_from = Some(self.state);
            self.enter(State::Paused, now);
        }
    }

    /// Record the leaderboard outcome after submission
    pub fn set_game_over_result(&mut self, rank: Option<usize>, is_highscore: bool) {
        self.leaderboard_rank = rank;
        self.is_new_highscore = is_highscore;
    }

    fn start_countdown(&mut self, now: f64) {
        self.lives = STARTING_LIVES;
        self.survival_time = 0.0;
        self.is_invincible = false;
        self.final_time = 0.0;
        self.is_new_highscore = false;
        self.leaderboard_rank = None;
        self.body_lost_since = None;
        self.body_lost_frames = 0;
        self.forced_difficulty = None;
        self.enter(State::Countdown, now);
    }

    fn start_playing(&mut self, now: f64) {
        self.play_start_time = now;
        self.survival_time = 0.0;
        self.enter(State::Playing, now);
    }

    fn trigger_game_over(&mut self, now: f64) {
        self.final_time = self.survival_time;
        self.is_invincible = false;
        self.enter(State::GameOver, now);
    }
}
