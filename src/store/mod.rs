// src/store/mod.rs

//! Persistence seam for the scoring engine.
//!
//! Handlers and the submission service depend on [`ScoreStore`], never on a
//! concrete backend. [`PgStore`] is the production backend; [`MemoryStore`]
//! keeps everything in-process.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    models::{
        attempt::{AttemptRecord, RecordedAttempt},
        leaderboard::{LeaderboardEntry, LeaderboardRow, SyncReport},
        profile::Profile,
        progress::{ProgressSummary, SubjectProgress, TopicProgress},
        task::{Subject, Task},
    },
    scoring::ScoringPolicy,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Lock or serialization conflict; the unit of work may be retried.
    #[error("concurrent update conflict")]
    Conflict,

    /// The user id is not known to storage.
    #[error("unknown user {0}")]
    UnknownUser(i64),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Task catalog lookup. `None` if the task does not exist.
    async fn find_task(&self, task_id: i64) -> Result<Option<Task>, StoreError>;

    async fn list_subjects(&self) -> Result<Vec<Subject>, StoreError>;

    /// Tasks of a topic in display order. Empty if the topic is unknown.
    async fn list_topic_tasks(&self, topic_id: i64) -> Result<Vec<Task>, StoreError>;

    /// The atomic submission step.
    ///
    /// Gets or creates the (user, task) record under a write lock, applies the
    /// attempt, and when points are awarded credits the profile and refreshes
    /// the leaderboard entry. Either all of it is persisted or none of it.
    async fn record_submission(
        &self,
        user_id: i64,
        task: &Task,
        is_correct: bool,
        policy: &ScoringPolicy,
    ) -> Result<RecordedAttempt, StoreError>;

    async fn attempt(&self, user_id: i64, task_id: i64)
    -> Result<Option<AttemptRecord>, StoreError>;

    async fn profile(&self, user_id: i64) -> Result<Option<Profile>, StoreError>;

    async fn leaderboard_entry(&self, user_id: i64)
    -> Result<Option<LeaderboardEntry>, StoreError>;

    /// Rank computed on read. `None` if the user has no entry yet.
    async fn rank_of(&self, user_id: i64) -> Result<Option<i64>, StoreError>;

    /// Highest scores first; ties go to the earliest updated entry.
    async fn top(&self, limit: i64) -> Result<Vec<LeaderboardRow>, StoreError>;

    /// Rebuilds every leaderboard entry from its profile.
    async fn sync_leaderboard(&self) -> Result<SyncReport, StoreError>;

    async fn progress(
        &self,
        user_id: i64,
        subject_id: Option<i64>,
    ) -> Result<ProgressSummary, StoreError>;

    async fn subject_progress(&self, user_id: i64) -> Result<Vec<SubjectProgress>, StoreError>;

    async fn topic_progress(
        &self,
        user_id: i64,
        topic_id: i64,
    ) -> Result<Option<TopicProgress>, StoreError>;
}
