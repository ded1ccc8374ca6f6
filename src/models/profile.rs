// src/models/profile.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Represents the 'user_profiles' table in the database.
/// `xp` is the lifetime sum of every `points_earned` credited to the user.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub user_id: i64,
    pub xp: i64,
    pub streak: i32,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(user_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            xp: 0,
            streak: 0,
            updated_at: now,
        }
    }

    /// Adds `points` to the lifetime total. Returns the new total.
    pub fn credit(&mut self, points: i32, now: DateTime<Utc>) -> i64 {
        self.xp += i64::from(points.max(0));
        self.updated_at = now;
        self.xp
    }
}
