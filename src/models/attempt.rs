// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::scoring::ScoringPolicy;

/// Represents the 'task_attempts' table in the database.
/// One row per (user, task) pair.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: i64,
    pub user_id: i64,
    pub task_id: i64,

    /// Submissions made while the task was unsolved.
    pub attempts: i32,

    /// Monotonic: once true, never reset.
    pub is_solved: bool,

    /// Set once, when `is_solved` flips to true.
    pub points_earned: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttemptRecord {
    /// A fresh, unattempted record.
    pub fn new(id: i64, user_id: i64, task_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            task_id,
            attempts: 0,
            is_solved: false,
            points_earned: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies one submission and returns the points awarded by it.
    ///
    /// A solved record is terminal: it is left untouched and awards nothing.
    /// Otherwise the attempt counter grows by one, and a correct answer solves
    /// the task with points computed from the new attempt count.
    ///
    /// The caller must hold the record under a write lock.
    pub fn record_attempt(
        &mut self,
        is_correct: bool,
        difficulty: i32,
        policy: &ScoringPolicy,
        now: DateTime<Utc>,
    ) -> i32 {
        if self.is_solved {
            return 0;
        }

        self.attempts += 1;
        self.updated_at = now;

        if !is_correct {
            return 0;
        }

        let points = policy.points_for(difficulty, self.attempts);
        self.is_solved = true;
        self.points_earned = points;
        points
    }

    pub fn state(&self) -> AttemptState {
        if self.is_solved {
            AttemptState::Solved {
                attempts: self.attempts,
                points_earned: self.points_earned,
            }
        } else {
            AttemptState::InProgress {
                attempts: self.attempts,
            }
        }
    }
}

/// Lifecycle of a single record. `Unattempted` is the absence of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    InProgress { attempts: i32 },
    Solved { attempts: i32, points_earned: i32 },
}

/// Outcome of the atomic submission step.
#[derive(Debug, Clone)]
pub struct RecordedAttempt {
    /// Post-state of the record.
    pub record: AttemptRecord,

    /// Points credited by this submission (0 when wrong or already solved).
    pub points_awarded: i32,

    /// The user's xp after crediting, when points were credited.
    pub xp: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> AttemptRecord {
        AttemptRecord::new(1, 10, 20, Utc::now())
    }

    #[test]
    fn correct_first_try_solves_with_full_points() {
        let mut record = fresh();
        let points = record.record_attempt(true, 2, &ScoringPolicy::default(), Utc::now());

        assert_eq!(points, 10);
        assert_eq!(
            record.state(),
            AttemptState::Solved {
                attempts: 1,
                points_earned: 10
            }
        );
    }

    #[test]
    fn wrong_then_right_uses_second_attempt_rate() {
        let policy = ScoringPolicy::default();
        let mut record = fresh();

        assert_eq!(record.record_attempt(false, 2, &policy, Utc::now()), 0);
        assert_eq!(record.state(), AttemptState::InProgress { attempts: 1 });

        assert_eq!(record.record_attempt(true, 2, &policy, Utc::now()), 7);
        assert_eq!(record.attempts, 2);
        assert_eq!(record.points_earned, 7);
    }

    #[test]
    fn solved_record_is_terminal() {
        let policy = ScoringPolicy::default();
        let mut record = fresh();
        record.record_attempt(true, 3, &policy, Utc::now());
        let snapshot = record.clone();

        assert_eq!(record.record_attempt(true, 3, &policy, Utc::now()), 0);
        assert_eq!(record.record_attempt(false, 3, &policy, Utc::now()), 0);
        assert_eq!(record, snapshot);
    }

    #[test]
    fn attempts_grow_by_one_per_unsolved_submission() {
        let policy = ScoringPolicy::default();
        let mut record = fresh();
        for expected in 1..=5 {
            record.record_attempt(false, 1, &policy, Utc::now());
            assert_eq!(record.attempts, expected);
            assert!(!record.is_solved);
            assert_eq!(record.points_earned, 0);
        }
    }
}
