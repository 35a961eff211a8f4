//! Struct-of-arrays particle pool
//!
//! Two visual events use particles: collision hits (colored sparks from the
//! impact point) and the high-score celebration burst. All physics state is
//! stored column-wise so the update step runs as tight loops over flat
//! slices. Slots are recycled round-robin regardless of liveness: an emit
//! that overruns the pool overwrites the oldest particles. Bounded and
//! lossy under saturation, by construction.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use crate::Color;
use crate::consts::*;

/// Fixed-capacity particle pool with column-oriented storage
pub struct ParticleSystem {
    capacity: usize,
    x: Vec<f32>,
    y: Vec<f32>,
    vx: Vec<f32>,
    vy: Vec<f32>,
    /// Remaining lifetime in seconds; <= 0 means the slot is inert
    life: Vec<f32>,
    life_max: Vec<f32>,
    size: Vec<f32>,
    color: Vec<Color>,
    /// Next slot to assign (round-robin, wraps)
    next_slot: usize,
}

/// Read-only view of one live particle, for the renderer
#[derive(Debug, Clone, Copy)]
pub struct ParticleView {
    pub pos: Vec2,
    pub size: f32,
    pub color: Color,
    /// Remaining lifetime fraction (1.0 = fresh, 0.0 = expired)
    pub life_frac: f32,
}

impl ParticleSystem {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0);
        Self {
            capacity,
            x: vec![0.0; capacity],
            y: vec![0.0; capacity],
            vx: vec![0.0; capacity],
            vy: vec![0.0; capacity],
            life: vec![0.0; capacity],
            life_max: vec![0.0; capacity],
            size: vec![0.0; capacity],
            color: vec![[0, 0, 0]; capacity],
            next_slot: 0,
        }
    }

    /// Pool with the default installation capacity
    pub fn with_default_capacity() -> Self {
        Self::new(PARTICLE_MAX_COUNT)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Spawn `count` particles at `origin` with radial outward velocity.
    ///
    /// Slots are claimed round-robin and overwritten wholesale; a count
    /// larger than the pool wraps and keeps only the newest `capacity`.
    pub fn emit<R: Rng>(
        &mut self,
        rng: &mut R,
        origin: Vec2,
        count: usize,
        color: Color,
        speed_min: f32,
        speed_max: f32,
    ) {
        for _ in 0..count {
            let i = self.next_slot;
            self.next_slot = (self.next_slot + 1) % self.capacity;

            let angle = rng.random_range(0.0..TAU);
            let speed = rng.random_range(speed_min..speed_max);
            let life = rng.random_range(PARTICLE_LIFETIME * 0.5..PARTICLE_LIFETIME);

            self.x[i] = origin.x;
            self.y[i] = origin.y;
            self.vx[i] = angle.cos() * speed;
            self.vy[i] = angle.sin() * speed;
            self.life[i] = life;
            self.life_max[i] = life;
            self.size[i] = rng.random_range(PARTICLE_SIZE_MIN..=PARTICLE_SIZE_MAX);
            self.color[i] = color;
        }
    }

    /// Emit a hit burst with the default speed range
    pub fn emit_hit<R: Rng>(&mut self, rng: &mut R, origin: Vec2, color: Color) {
        self.emit(
            rng,
            origin,
            PARTICLES_ON_HIT,
            color,
            PARTICLE_SPEED_MIN,
            PARTICLE_SPEED_MAX,
        );
    }

    /// Physics step over every live slot: integrate position, apply drag,
    /// pull downward, decay lifetime. Velocities are in pixels per frame;
    /// only the lifetime decay consumes wall time.
    pub fn update(&mut self, dt: f32) {
        for i in 0..self.capacity {
            if self.life[i] <= 0.0 {
                continue;
            }
            self.x[i] += self.vx[i];
            self.y[i] += self.vy[i];
            self.vx[i] *= PARTICLE_DRAG;
            self.vy[i] *= PARTICLE_DRAG;
            self.vy[i] += PARTICLE_GRAVITY;
            self.life[i] -= dt;
        }
    }

    /// Kill all particles (on session reset)
    pub fn clear(&mut self) {
        self.life.fill(0.0);
    }

    /// Number of currently live particles
    pub fn alive_count(&self) -> usize {
        self.life.iter().filter(|&&l| l > 0.0).count()
    }

    /// Iterate over live particles. The renderer loop is bounded by the
    /// live count, not the pool capacity.
    pub fn iter_alive(&self) -> impl Iterator<Item = ParticleView> + '_ {
        (0..self.capacity).filter_map(move |i| {
            if self.life[i] <= 0.0 {
                return None;
            }
            Some(ParticleView {
                pos: Vec2::new(self.x[i], self.y[i]),
                size: self.size[i],
                color: self.color[i],
                life_frac: (self.life[i] / self.life_max[i].max(0.01)).clamp(0.0, 1.0),
            })
        })
    }
}
