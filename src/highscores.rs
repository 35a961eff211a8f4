//! Survival-time leaderboard
//!
//! Persisted to a JSON file, tracks the top 10 survival times in
//! descending order. Every I/O failure is absorbed at this boundary:
//! a missing or corrupt file degrades to an empty board, a failed write
//! loses persistence but nothing else. The game core never sees a
//! persistence error.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::consts::{LEADERBOARD_FILE, LEADERBOARD_MAX_ENTRIES};

/// Internal persistence failure; never escapes this module
#[derive(Debug, Error)]
enum PersistenceError {
    #[error("leaderboard io: {0}")]
    Io(#[from] std::io::Error),
    #[error("leaderboard parse: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("leaderboard file is not a list of numbers")]
    Shape,
}

/// Top survival times, longest first
#[derive(Debug)]
pub struct Leaderboard {
    path: PathBuf,
    scores: Vec<f64>,
}

impl Leaderboard {
    /// Load from the default file next to the binary
    pub fn load_default() -> Self {
        Self::load(LEADERBOARD_FILE)
    }

    /// Load from the given path; any failure yields an empty board
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let scores = match Self::read_scores(&path) {
            Ok(scores) => scores,
            Err(err) => {
                if path.exists() {
                    log::warn!("Leaderboard unreadable, starting empty: {err}");
                }
                Vec::new()
            }
        };
        Self { path, scores }
    }

    fn read_scores(path: &Path) -> Result<Vec<f64>, PersistenceError> {
        let text = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        let list = value.as_array().ok_or(PersistenceError::Shape)?;
        let mut scores: Vec<f64> = list
            .iter()
            .filter_map(|v| v.as_f64())
            .filter(|s| s.is_finite() && *s >= 0.0)
            .collect();
        scores.sort_by(|a, b| b.total_cmp(a));
        scores.truncate(LEADERBOARD_MAX_ENTRIES);
        Ok(scores)
    }

    fn save(&self) {
        let result: Result<(), PersistenceError> = serde_json::to_string_pretty(&self.scores)
            .map_err(PersistenceError::from)
            .and_then(|json| fs::write(&self.path, json).map_err(PersistenceError::from));
        if let Err(err) = result {
            // Non-fatal: we just lose persistence
            log::warn!("Leaderboard save failed: {err}");
        }
    }

    /// Submit a finished session.
    ///
    /// Returns the 0-indexed rank (None if the score missed the board) and
    /// whether this is a new #1. The file is written immediately,
    /// best-effort.
    pub fn submit(&mut self, survival_time: f64) -> (Option<usize>, bool) {
        let score = (survival_time * 10.0).round() / 10.0;

        let is_highscore = self.scores.first().map(|&top| score > top).unwrap_or(true);

        let rank = self
            .scores
            .iter()
            .position(|&existing| score >= existing)
            .unwrap_or(self.scores.len());
        if rank >= LEADERBOARD_MAX_ENTRIES {
            return (None, false);
        }
        self.scores.insert(rank, score);
        self.scores.truncate(LEADERBOARD_MAX_ENTRIES);

        self.save();
        (Some(rank), is_highscore)
    }

    /// Current scores, descending (read-only view for the HUD)
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn top_score(&self) -> Option<f64> {
        self.scores.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Operator reset: clear all scores and persist the empty board
    pub fn reset(&mut self) {
        self.scores.clear();
        self.save();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_board(name: &str) -> Leaderboard {
        let path = std::env::temp_dir().join(format!("laser-dodge-test-{name}-{}.json", std::process::id()));
        let _ = fs::remove_file(&path);
        Leaderboard::load(&path)
    }

    #[test]
    fn test_missing_file_is_empty_board() {
        let lb = temp_board("missing");
        assert!(lb.is_empty());
    }

    #[test]
    fn test_submit_ranks_descending() {
        let mut lb = temp_board("ranks");
        assert_eq!(lb.submit(10.0), (Some(0), true));
        assert_eq!(lb.submit(25.0), (Some(0), true));
        // Shorter survival lands below
        assert_eq!(lb.submit(17.3), (Some(1), false));
        assert_eq!(lb.scores(), &[25.0, 17.3, 10.0]);
        let _ = fs::remove_file(&lb.path);
    }

    #[test]
    fn test_board_caps_at_max_entries() {
        let mut lb = temp_board("caps");
        for i in 1..=LEADERBOARD_MAX_ENTRIES {
            lb.submit(i as f64);
        }
        assert_eq!(lb.scores().len(), LEADERBOARD_MAX_ENTRIES);
        // Too slow to qualify
        assert_eq!(lb.submit(0.5), (None, false));
        assert_eq!(lb.scores().len(), LEADERBOARD_MAX_ENTRIES);
        let _ = fs::remove_file(&lb.path);
    }

    #[test]
    fn test_corrupt_file_degrades_to_empty() {
        let path = std::env::temp_dir().join(format!(
            "laser-dodge-test-corrupt-{}.json",
            std::process::id()
        ));
        fs::write(&path, "{not json").unwrap();
        let lb = Leaderboard::load(&path);
        assert!(lb.is_empty());

        // Wrong shape is equally tolerated
        fs::write(&path, "{\"scores\": 3}").unwrap();
        let lb = Leaderboard::load(&path);
        assert!(lb.is_empty());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_round_trip_persistence() {
        let mut lb = temp_board("roundtrip");
        lb.submit(42.17); // Rounded to one decimal on submit
        let path = lb.path.clone();
        let reloaded = Leaderboard::load(&path);
        assert_eq!(reloaded.scores(), &[42.2]);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_reset_clears_and_persists() {
        let mut lb = temp_board("reset");
        lb.submit(30.0);
        lb.reset();
        assert!(lb.is_empty());
        let reloaded = Leaderboard::load(&lb.path);
        assert!(reloaded.is_empty());
        let _ = fs::remove_file(&lb.path);
    }

    #[test]
    fn test_highscore_flag_only_for_new_top() {
        let mut lb = temp_board("top");
        let (_, first) = lb.submit(20.0);
        assert!(first); // Empty board: any score is a high score
        let (_, not_top) = lb.submit(15.0);
        assert!(!not_top);
        let (_, new_top) = lb.submit(21.0);
        assert!(new_top);
        // Equal to the top is not a NEW high score
        let (_, tie) = lb.submit(21.0);
        assert!(!tie);
        let _ = fs::remove_file(&lb.path);
    }
}
