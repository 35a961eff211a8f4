//! Anti-camping detection
//!
//! Tracks an exponentially smoothed centroid of the player's silhouette
//! while gameplay is live. Standing still for too long arms a warning
//! reticle; staying put through the warning window fires a one-shot signal
//! that the spawner turns into a targeted anti-camp beam. Smoothing keeps
//! segmentation noise from counting as movement.

use glam::Vec2;

use crate::consts::*;

/// Weight of the previous centroid in the EMA update
const SMOOTHING: f32 = 0.95;

/// Centroid-stability tracker driving the anti-camp beam
#[derive(Debug, Default)]
pub struct CampDetector {
    /// Smoothed reference centroid; None until the first sample
    centroid: Option<Vec2>,
    /// When the player became stationary; None while moving
    camp_start: Option<f64>,
    warning_active: bool,
    /// Frozen at the moment the warning arms
    target: Vec2,
}

impl CampDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame of tracking.
    ///
    /// `in_play` must be true only while the session is in PLAYING or HIT;
    /// any other state clears all camp tracking. `sample` is the body mask
    /// centroid, or None when no body is detected (no change).
    pub fn update(&mut self, now: f64, in_play: bool, sample: Option<Vec2>) {
        if !in_play {
            self.reset();
            return;
        }
        let Some(sample) = sample else {
            return;
        };

        let Some(reference) = self.centroid else {
            self.centroid = Some(sample);
            return;
        };

        if (sample - reference).length() > CAMPING_THRESHOLD {
            // Genuine movement: snap the reference and restart the cycle
            self.centroid = Some(sample);
            self.camp_start = None;
            self.warning_active = false;
            return;
        }

        let start = *self.camp_start.get_or_insert(now);
        if !self.warning_active && now - start >= CAMPING_TIME {
            self.warning_active = true;
            self.target = reference;
        }

        // Smooth the reference against segmentation jitter
        self.centroid = Some(reference * SMOOTHING + sample * (1.0 - SMOOTHING));
    }

    /// Whether the warning reticle should be shown
    pub fn warning_active(&self) -> bool {
        self.warning_active
    }

    /// Reticle position while the warning is armed
    pub fn target(&self) -> Option<Vec2> {
        self.warning_active.then_some(self.target)
    }

    /// Consume the fire signal once the warning window has elapsed.
    ///
    /// Edge-triggered: returns the frozen target at most once per arm
    /// cycle, then the detector is fully unarmed and needs the whole
    /// stationary-plus-warning duration to arm again.
    pub fn take_fire(&mut self, now: f64) -> Option<Vec2> {
        if !self.warning_active {
            return None;
        }
        let start = self.camp_start?;
        if now - start < CAMPING_TIME + CAMPING_WARNING_TIME {
            return None;
        }
        self.camp_start = None;
        self.warning_active = false;
        Some(self.target)
    }

    /// Clear all tracking state
    pub fn reset(&mut self) {
        self.centroid = None;
        self.camp_start = None;
        self.warning_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STILL: Vec2 = Vec2::new(320.0, 240.0);

    /// Drive the detector with a stationary player for `secs`
    fn hold_still(d: &mut CampDetector, from: f64, secs: f64) -> f64 {
        let mut now = from;
        while now <= from + secs {
            d.update(now, true, Some(STILL));
            now += 1.0 / 30.0;
        }
        now
    }

    #[test]
    fn test_warning_arms_after_stationary_time() {
        let mut d = CampDetector::new();
        hold_still(&mut d, 0.0, CAMPING_TIME - 0.5);
        assert!(!d.warning_active());
        hold_still(&mut d, CAMPING_TIME - 0.4, 0.6);
        assert!(d.warning_active());
        assert!(d.target().is_some());
    }

    #[test]
    fn test_movement_resets_same_update() {
        let mut d = CampDetector::new();
        hold_still(&mut d, 0.0, CAMPING_TIME + 0.5);
        assert!(d.warning_active());
        // One big jump clears both the timer and the warning immediately
        d.update(
            CAMPING_TIME + 1.0,
            true,
            Some(STILL + Vec2::new(CAMPING_THRESHOLD + 5.0, 0.0)),
        );
        assert!(!d.warning_active());
        assert!(d.take_fire(CAMPING_TIME + 100.0).is_none());
    }

    #[test]
    fn test_small_jitter_does_not_reset() {
        let mut d = CampDetector::new();
        let mut now = 0.0;
        while now <= CAMPING_TIME + 0.5 {
            let jitter = Vec2::new((now * 13.0).sin() as f32 * 5.0, 0.0);
            d.update(now, true, Some(STILL + jitter));
            now += 1.0 / 30.0;
        }
        assert!(d.warning_active());
    }

    #[test]
    fn test_fire_is_one_shot_and_rearms_from_zero() {
        let mut d = CampDetector::new();
        let now = hold_still(&mut d, 0.0, CAMPING_TIME + CAMPING_WARNING_TIME + 0.2);
        let target = d.take_fire(now);
        assert!(target.is_some());
        // Consumed: immediately unarmed, no second fire
        assert!(!d.warning_active());
        assert!(d.take_fire(now).is_none());

        // Re-arming needs the full stationary duration again
        let now2 = hold_still(&mut d, now, CAMPING_TIME - 0.5);
        assert!(!d.warning_active());
        assert!(d.take_fire(now2).is_none());
        let now3 = hold_still(&mut d, now2, CAMPING_WARNING_TIME + 1.5);
        assert!(d.take_fire(now3).is_some());
    }

    #[test]
    fn test_target_frozen_at_arming() {
        let mut d = CampDetector::new();
        hold_still(&mut d, 0.0, CAMPING_TIME + 0.1);
        let armed_at = d.target().unwrap();
        // Drift within the threshold must not drag the frozen target
        let mut now = CAMPING_TIME + 0.2;
        while now < CAMPING_TIME + 1.0 {
            d.update(now, true, Some(STILL + Vec2::new(10.0, 0.0)));
            now += 1.0 / 30.0;
        }
        assert_eq!(d.target().unwrap(), armed_at);
    }

    #[test]
    fn test_leaving_play_clears_state() {
        let mut d = CampDetector::new();
        hold_still(&mut d, 0.0, CAMPING_TIME + 0.5);
        assert!(d.warning_active());
        d.update(CAMPING_TIME + 1.0, false, None);
        assert!(!d.warning_active());
        assert!(d.take_fire(CAMPING_TIME + 100.0).is_none());
    }

    #[test]
    fn test_no_body_keeps_state() {
        let mut d = CampDetector::new();
        hold_still(&mut d, 0.0, CAMPING_TIME + 0.5);
        d.update(CAMPING_TIME + 1.0, true, None);
        assert!(d.warning_active());
    }
}
