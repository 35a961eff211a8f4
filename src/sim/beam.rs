//! Laser beam entities, spawn timing and collision
//!
//! Beams appear at fixed positions with a gap the player must dodge into.
//! Each beam runs a two-phase lifecycle:
//!   1. WARNING: position and safe gap are previewed, no collision
//!   2. ACTIVE: beam is dangerous; a collision mask exists only now
//!
//! Phase is monotonic (WARNING -> ACTIVE -> removed). Difficulty parameters
//! come from the pure curves in `difficulty`; geometry randomness comes
//! from the pool's seeded RNG so spawn sequences are reproducible.

use glam::Vec2;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::consts::*;
use crate::mask::Mask;
use crate::{Color, colors};

use super::difficulty;

/// Margin keeping beam lines away from the screen edge
const LINE_MARGIN: usize = 60;
/// Extra margin keeping the dodge gap fully on screen
const GAP_EDGE_MARGIN: usize = 20;

/// Beam type tag, used for unlock gating and weighted spawning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeamKind {
    Horizontal,
    Vertical,
    Cross,
    AnkleBreaker,
    HeadHunter,
    AntiCamp,
}

/// Lifecycle phase of a beam
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeamPhase {
    /// Preview only; collision is impossible in this phase
    Warning,
    /// Fully dangerous
    Active,
}

/// A full-span line with a dodgeable gap
#[derive(Debug, Clone, Copy)]
pub struct LineGeometry {
    /// Fixed coordinate of the line (y for horizontal, x for vertical)
    pub pos: usize,
    /// Center of the gap along the line
    pub gap_center: usize,
    /// Gap extent in pixels
    pub gap_size: usize,
}

/// Per-variant beam geometry
#[derive(Debug, Clone, Copy)]
pub enum BeamShape {
    Horizontal(LineGeometry),
    Vertical(LineGeometry),
    /// Horizontal + vertical sub-beams sharing one lifecycle
    Cross {
        horizontal: LineGeometry,
        vertical: LineGeometry,
    },
    /// Solid zone over the bottom of the screen, no gap (forces a jump)
    AnkleBreaker,
    /// Solid zone over the top of the screen, no gap (forces a duck)
    HeadHunter,
    /// Full-height vertical at the camp target, no gap
    AntiCamp { x: usize },
}

/// A laser beam at a fixed position
#[derive(Debug, Clone)]
pub struct Beam {
    pub shape: BeamShape,
    pub phase: BeamPhase,
    /// Seconds remaining in the current phase
    phase_timer: f32,
    warning_duration: f32,
    active_duration: f32,
    pub alive: bool,
    screen_w: usize,
    screen_h: usize,
}

impl Beam {
    /// Spawn a beam of the given kind with difficulty-driven timing and
    /// randomized geometry. `AntiCamp` goes through [`Beam::anti_camp`].
    fn spawn<R: Rng>(kind: BeamKind, t: f32, w: usize, h: usize, rng: &mut R) -> Self {
        let gap_frac = difficulty::gap_fraction(t);
        let shape = match kind {
            BeamKind::Horizontal => BeamShape::Horizontal(random_line(rng, h, w, gap_frac)),
            BeamKind::Vertical => BeamShape::Vertical(random_line(rng, w, h, gap_frac)),
            BeamKind::Cross => BeamShape::Cross {
                horizontal: random_line(rng, h, w, gap_frac),
                vertical: random_line(rng, w, h, gap_frac),
            },
            BeamKind::AnkleBreaker => BeamShape::AnkleBreaker,
            BeamKind::HeadHunter => BeamShape::HeadHunter,
            BeamKind::AntiCamp => unreachable!("anti-camp beams are targeted, not drawn"),
        };
        Self::with_shape(
            shape,
            difficulty::warning_duration(t),
            difficulty::active_duration(t),
            w,
            h,
        )
    }

    /// Targeted anti-camp beam at the frozen camp X. Uses its own short
    /// warning (the player already watched the reticle) and fixed active
    /// duration instead of the difficulty curves.
    pub fn anti_camp(x: usize, w: usize, h: usize) -> Self {
        Self::with_shape(
            BeamShape::AntiCamp { x: x.min(w - 1) },
            ANTI_CAMP_WARNING,
            ANTI_CAMP_ACTIVE,
            w,
            h,
        )
    }

    fn with_shape(
        shape: BeamShape,
        warning_duration: f32,
        active_duration: f32,
        screen_w: usize,
        screen_h: usize,
    ) -> Self {
        Self {
            shape,
            phase: BeamPhase::Warning,
            phase_timer: warning_duration,
            warning_duration,
            active_duration,
            alive: true,
            screen_w,
            screen_h,
        }
    }

    pub fn kind(&self) -> BeamKind {
        match self.shape {
            BeamShape::Horizontal(_) => BeamKind::Horizontal,
            BeamShape::Vertical(_) => BeamKind::Vertical,
            BeamShape::Cross { .. } => BeamKind::Cross,
            BeamShape::AnkleBreaker => BeamKind::AnkleBreaker,
            BeamShape::HeadHunter => BeamKind::HeadHunter,
            BeamShape::AntiCamp { .. } => BeamKind::AntiCamp,
        }
    }

    /// Primary color, attached to hit feedback (cross reports its
    /// horizontal half)
    pub fn color(&self) -> Color {
        match self.shape {
            BeamShape::Horizontal(_) | BeamShape::Cross { .. } => colors::LASER_HORIZONTAL,
            BeamShape::Vertical(_) => colors::LASER_VERTICAL,
            BeamShape::AnkleBreaker => colors::LASER_ANKLE_BREAKER,
            BeamShape::HeadHunter => colors::LASER_HEAD_HUNTER,
            BeamShape::AntiCamp { .. } => colors::LASER_ANTI_CAMP,
        }
    }

    /// Fraction of the current phase elapsed (0 -> 1), for the renderer
    pub fn phase_progress(&self) -> f32 {
        let total = match self.phase {
            BeamPhase::Warning => self.warning_duration,
            BeamPhase::Active => self.active_duration,
        };
        (1.0 - self.phase_timer / total.max(1e-6)).clamp(0.0, 1.0)
    }

    /// Seconds left in the current phase
    pub fn phase_remaining(&self) -> f32 {
        self.phase_timer.max(0.0)
    }

    /// Advance the lifecycle. Returns false once the beam should be removed.
    pub fn update(&mut self, dt: f32) -> bool {
        self.phase_timer -= dt;
        match self.phase {
            BeamPhase::Warning => {
                if self.phase_timer <= 0.0 {
                    self.phase = BeamPhase::Active;
                    self.phase_timer = self.active_duration;
                }
            }
            BeamPhase::Active => {
                if self.phase_timer <= 0.0 {
                    self.alive = false;
                }
            }
        }
        self.alive
    }

    /// Collision mask, regenerated from the authoritative shape.
    /// None during WARNING: collision is impossible until the beam fires.
    pub fn collision_mask(&self) -> Option<Mask> {
        if self.phase != BeamPhase::Active {
            return None;
        }
        let mut mask = Mask::zeros(self.screen_w, self.screen_h);
        match self.shape {
            BeamShape::Horizontal(line) => fill_horizontal(&mut mask, line),
            BeamShape::Vertical(line) => fill_vertical(&mut mask, line),
            BeamShape::Cross {
                horizontal,
                vertical,
            } => {
                fill_horizontal(&mut mask, horizontal);
                fill_vertical(&mut mask, vertical);
            }
            BeamShape::AnkleBreaker => {
                let zone = (self.screen_h as f32 * ANKLE_BREAKER_HEIGHT) as usize;
                mask.fill_rect(0, self.screen_h - zone, self.screen_w, self.screen_h);
            }
            BeamShape::HeadHunter => {
                let zone = (self.screen_h as f32 * HEAD_HUNTER_HEIGHT) as usize;
                mask.fill_rect(0, 0, self.screen_w, zone);
            }
            BeamShape::AntiCamp { x } => {
                let half = BEAM_CORE_WIDTH / 2;
                mask.fill_rect(x.saturating_sub(half), 0, x + half, self.screen_h);
            }
        }
        Some(mask)
    }
}

/// Randomize a full-span line: `span` is the axis the line runs along
/// (where the gap lives), `extent` the axis the position is drawn from.
fn random_line<R: Rng>(rng: &mut R, extent: usize, span: usize, gap_frac: f32) -> LineGeometry {
    let pos = rng.random_range(LINE_MARGIN..=extent - LINE_MARGIN);
    let gap_size = (span as f32 * gap_frac) as usize;
    let gap_margin = gap_size / 2 + GAP_EDGE_MARGIN;
    let gap_center = rng.random_range(gap_margin..=span - gap_margin);
    LineGeometry {
        pos,
        gap_center,
        gap_size,
    }
}

/// Fill a horizontal beam band, then cut the gap out of it
fn fill_horizontal(mask: &mut Mask, line: LineGeometry) {
    let half = BEAM_CORE_WIDTH / 2;
    let y0 = line.pos.saturating_sub(half);
    let y1 = line.pos + half;
    mask.fill_rect(0, y0, mask.width(), y1);
    let gap_l = line.gap_center.saturating_sub(line.gap_size / 2);
    let gap_r = line.gap_center + line.gap_size / 2;
    mask.clear_rect(gap_l, y0, gap_r, y1);
}

/// Fill a vertical beam band, then cut the gap out of it
fn fill_vertical(mask: &mut Mask, line: LineGeometry) {
    let half = BEAM_CORE_WIDTH / 2;
    let x0 = line.pos.saturating_sub(half);
    let x1 = line.pos + half;
    mask.fill_rect(x0, 0, x1, mask.height());
    let gap_t = line.gap_center.saturating_sub(line.gap_size / 2);
    let gap_b = line.gap_center + line.gap_size / 2;
    mask.clear_rect(x0, gap_t, x1, gap_b);
}

/// Collision report: where the player touched a beam, and with what color
#[derive(Debug, Clone, Copy)]
pub struct HitInfo {
    /// Centroid of the overlapping pixels
    pub point: Vec2,
    /// Primary color of the beam that hit
    pub color: Color,
}

/// Owns all live beams: spawn timing, lifecycle updates and collision
pub struct BeamPool {
    screen_w: usize,
    screen_h: usize,
    beams: Vec<Beam>,
    time_since_spawn: f32,
    rng: Pcg32,
}

impl BeamPool {
    pub fn new(screen_w: usize, screen_h: usize, seed: u64) -> Self {
        Self {
            screen_w,
            screen_h,
            beams: Vec::new(),
            time_since_spawn: 0.0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Clear all beams and the spawn accumulator (on session start)
    pub fn reset(&mut self) {
        self.beams.clear();
        self.time_since_spawn = 0.0;
    }

    /// Spawn when the difficulty interval has elapsed, then advance every
    /// beam and drop the expired ones.
    pub fn update(&mut self, dt: f32, survival_time: f32) {
        self.time_since_spawn += dt;
        if self.time_since_spawn >= difficulty::spawn_interval(survival_time) {
            self.time_since_spawn = 0.0;
            let kind = self.draw_kind(survival_time);
            let beam = Beam::spawn(kind, survival_time, self.screen_w, self.screen_h, &mut self.rng);
            self.beams.push(beam);
        }
        self.beams.retain_mut(|b| b.update(dt));
    }

    /// Weighted random draw from the types unlocked at time T
    fn draw_kind(&mut self, t: f32) -> BeamKind {
        let types = difficulty::unlocked_types(t);
        let total: u32 = types.iter().map(|&(_, w)| w).sum();
        let mut pick = self.rng.random_range(0..total);
        for &(kind, weight) in &types {
            if pick < weight {
                return kind;
            }
            pick -= weight;
        }
        types[types.len() - 1].0
    }

    /// Inject the targeted anti-camp beam at the frozen camp X
    pub fn spawn_anti_camp(&mut self, x: usize) {
        self.beams
            .push(Beam::anti_camp(x, self.screen_w, self.screen_h));
    }

    /// Test the (eroded) body mask against every ACTIVE beam in insertion
    /// order. The first beam with a non-empty overlap reports the hit;
    /// testing stops there (single hit per tick).
    pub fn check_collision(&self, body: &Mask) -> Option<HitInfo> {
        for beam in &self.beams {
            let Some(beam_mask) = beam.collision_mask() else {
                continue;
            };
            if let Some(overlap) = body.overlap(&beam_mask) {
                return Some(HitInfo {
                    point: overlap.centroid,
                    color: beam.color(),
                });
            }
        }
        None
    }

    /// Renderable view of all live beams
    pub fn beams(&self) -> &[Beam] {
        &self.beams
    }
}
