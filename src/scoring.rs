// src/scoring.rs

use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_BASE_MULTIPLIER, DEFAULT_LATER_ATTEMPT_PERCENT, DEFAULT_SECOND_ATTEMPT_PERCENT,
};

/// Diminishing-returns policy for solved tasks.
///
/// A correct answer on the first attempt earns `difficulty * base_multiplier`.
/// The second attempt earns `second_attempt_percent` of that, any later attempt
/// earns `later_attempt_percent`. Fractions are floored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub base_multiplier: i32,
    pub second_attempt_percent: i32,
    pub later_attempt_percent: i32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            base_multiplier: DEFAULT_BASE_MULTIPLIER,
            second_attempt_percent: DEFAULT_SECOND_ATTEMPT_PERCENT,
            later_attempt_percent: DEFAULT_LATER_ATTEMPT_PERCENT,
        }
    }
}

impl ScoringPolicy {
    /// Full credit for a task of the given difficulty.
    pub fn base_points(&self, difficulty: i32) -> i32 {
        difficulty.max(0).saturating_mul(self.base_multiplier.max(0))
    }

    /// Points for a correct answer given on `attempt_number` (1-based).
    ///
    /// Attempt numbers below 1 are treated as a first attempt.
    pub fn points_for(&self, difficulty: i32, attempt_number: i32) -> i32 {
        let base = self.base_points(difficulty);
        let percent = match attempt_number {
            n if n <= 1 => return base,
            2 => self.second_attempt_percent,
            _ => self.later_attempt_percent,
        };

        // Integer division on non-negative operands is a floor.
        let scaled = i64::from(base) * i64::from(percent.clamp(0, 100)) / 100;
        scaled as i32
    }
}
