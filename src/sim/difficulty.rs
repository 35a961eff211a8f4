//! Difficulty curves
//!
//! Every tuning value is a pure, monotone-clamped function of T, the
//! survival time in seconds. No state, no side effects: the same T always
//! produces the same numbers, which keeps spawning reproducible in tests.

use crate::Color;
use crate::consts::*;

use super::beam::BeamKind;

/// Seconds between beam spawns
pub fn spawn_interval(t: f32) -> f32 {
    (SPAWN_BASE_INTERVAL - t * SPAWN_INTERVAL_DECAY).max(SPAWN_MIN_INTERVAL)
}

/// Dodge gap size as a fraction of the screen dimension
pub fn gap_fraction(t: f32) -> f32 {
    (GAP_BASE_SIZE - t * GAP_SHRINK_RATE).max(GAP_MIN_SIZE)
}

/// Warning phase duration in seconds
pub fn warning_duration(t: f32) -> f32 {
    (WARNING_BASE_MS - t * WARNING_DECAY_MS).max(WARNING_MIN_MS) / 1000.0
}

/// Active (dangerous) phase duration in seconds
pub fn active_duration(t: f32) -> f32 {
    (BEAM_ACTIVE_BASE - t * BEAM_ACTIVE_DECAY).max(BEAM_ACTIVE_MIN)
}

/// Beam types unlocked at time T, with their spawn weights.
///
/// Weights are fixed per type; the spawner draws proportionally from this
/// list. Horizontal is always available.
pub fn unlocked_types(t: f32) -> Vec<(BeamKind, u32)> {
    let mut types = vec![(BeamKind::Horizontal, 3)];
    if t >= UNLOCK_ANKLE_BREAKER {
        types.push((BeamKind::AnkleBreaker, 1));
    }
    if t >= UNLOCK_VERTICAL {
        types.push((BeamKind::Vertical, 3));
    }
    if t >= UNLOCK_HEAD_HUNTER {
        types.push((BeamKind::HeadHunter, 1));
    }
    if t >= UNLOCK_CROSS {
        types.push((BeamKind::Cross, 2));
    }
    types
}

/// Difficulty tier shown by the HUD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Easy,
    Medium,
    Hard,
    Insane,
}

impl Tier {
    /// Tier from survival time using the fixed breakpoints
    pub fn from_survival_time(t: f64) -> Self {
        if t < 15.0 {
            Tier::Easy
        } else if t < 30.0 {
            Tier::Medium
        } else if t < 60.0 {
            Tier::Hard
        } else {
            Tier::Insane
        }
    }

    /// Tier from the operator's forced setting (1-4, clamped)
    pub fn from_forced(level: u8) -> Self {
        match level {
            0 | 1 => Tier::Easy,
            2 => Tier::Medium,
            3 => Tier::Hard,
            _ => Tier::Insane,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Easy => "EASY",
            Tier::Medium => "MEDIUM",
            Tier::Hard => "HARD",
            Tier::Insane => "INSANE",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Tier::Easy => [0, 200, 83],
            Tier::Medium => [255, 214, 0],
            Tier::Hard => [255, 109, 0],
            Tier::Insane => [213, 0, 0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_curve_values_at_zero() {
        assert!((spawn_interval(0.0) - SPAWN_BASE_INTERVAL).abs() < 1e-6);
        assert!((gap_fraction(0.0) - GAP_BASE_SIZE).abs() < 1e-6);
        assert!((warning_duration(0.0) - 1.5).abs() < 1e-6);
        assert!((active_duration(0.0) - BEAM_ACTIVE_BASE).abs() < 1e-6);
    }

    #[test]
    fn test_curves_reach_floor() {
        // Far beyond any plausible survival time
        let t = 100_000.0;
        assert_eq!(spawn_interval(t), SPAWN_MIN_INTERVAL);
        assert_eq!(gap_fraction(t), GAP_MIN_SIZE);
        assert!((warning_duration(t) - 0.5).abs() < 1e-6);
        assert_eq!(active_duration(t), BEAM_ACTIVE_MIN);
    }

    #[test]
    fn test_unlock_progression() {
        let kinds = |t: f32| -> Vec<BeamKind> {
            unlocked_types(t).into_iter().map(|(k, _)| k).collect()
        };
        assert_eq!(kinds(0.0), vec![BeamKind::Horizontal]);
        assert_eq!(kinds(9.9), vec![BeamKind::Horizontal]);
        assert_eq!(
            kinds(10.0),
            vec![BeamKind::Horizontal, BeamKind::AnkleBreaker]
        );
        assert_eq!(
            kinds(31.0),
            vec![
                BeamKind::Horizontal,
                BeamKind::AnkleBreaker,
                BeamKind::Vertical,
                BeamKind::HeadHunter,
                BeamKind::Cross,
            ]
        );
    }

    #[test]
    fn test_unlock_weights() {
        let weights: Vec<u32> = unlocked_types(31.0).into_iter().map(|(_, w)| w).collect();
        assert_eq!(weights, vec![3, 1, 3, 1, 2]);
    }

    #[test]
    fn test_tier_breakpoints() {
        assert_eq!(Tier::from_survival_time(0.0), Tier::Easy);
        assert_eq!(Tier::from_survival_time(14.9), Tier::Easy);
        assert_eq!(Tier::from_survival_time(15.0), Tier::Medium);
        assert_eq!(Tier::from_survival_time(30.0), Tier::Hard);
        assert_eq!(Tier::from_survival_time(60.0), Tier::Insane);
        assert_eq!(Tier::from_forced(1), Tier::Easy);
        assert_eq!(Tier::from_forced(4), Tier::Insane);
    }

    proptest! {
        #[test]
        fn prop_spawn_interval_monotone(a in 0.0f32..10_000.0, b in 0.0f32..10_000.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(spawn_interval(hi) <= spawn_interval(lo));
            prop_assert!(spawn_interval(hi) >= SPAWN_MIN_INTERVAL);
        }

        #[test]
        fn prop_gap_fraction_monotone(a in 0.0f32..10_000.0, b in 0.0f32..10_000.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(gap_fraction(hi) <= gap_fraction(lo));
            prop_assert!(gap_fraction(hi) >= GAP_MIN_SIZE);
        }

        #[test]
        fn prop_warning_duration_monotone(a in 0.0f32..10_000.0, b in 0.0f32..10_000.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(warning_duration(hi) <= warning_duration(lo));
            prop_assert!(warning_duration(hi) >= WARNING_MIN_MS / 1000.0);
        }

        #[test]
        fn prop_active_duration_monotone(a in 0.0f32..10_000.0, b in 0.0f32..10_000.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(active_duration(hi) <= active_duration(lo));
            prop_assert!(active_duration(hi) >= BEAM_ACTIVE_MIN);
        }
    }
}
