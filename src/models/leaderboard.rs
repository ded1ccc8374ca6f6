// src/models/leaderboard.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::profile::Profile;

/// Represents the 'leaderboard_entries' table in the database.
/// A projection of `Profile::xp`, never a source of truth.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub points: i64,
    pub updated_at: DateTime<Utc>,
}

impl LeaderboardEntry {
    /// Builds or refreshes the entry mirroring `profile`.
    pub fn sync_from(existing: Option<Self>, profile: &Profile, now: DateTime<Utc>) -> Self {
        match existing {
            Some(mut entry) => {
                entry.points = profile.xp;
                entry.updated_at = now;
                entry
            }
            None => Self {
                user_id: profile.user_id,
                points: profile.xp,
                updated_at: now,
            },
        }
    }
}

/// Leaderboard row joined with the user's display name.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct LeaderboardRow {
    pub user_id: i64,
    pub username: String,
    pub points: i64,
    pub updated_at: DateTime<Utc>,
}

/// Result of rebuilding the projection from profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub created: u64,
    pub updated: u64,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct LeaderboardParams {
    /// Number of rows to return.
    #[validate(range(min = 1, message = "limit must be positive"))]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardRow>,
    pub user_rank: Option<i64>,
}

/// `1 + number of entries with strictly more points`.
///
/// Equal scores share a rank.
pub fn rank_for<I>(points: i64, all_points: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    1 + all_points.into_iter().filter(|p| *p > points).count() as i64
}

/// Orders rows by points descending, then earliest update, then user id.
pub fn sort_rows(rows: &mut [LeaderboardRow]) {
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(a.updated_at.cmp(&b.updated_at))
            .then(a.user_id.cmp(&b.user_id))
    });
}
