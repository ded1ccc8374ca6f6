// src/store/postgres.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};

use super::{ScoreStore, StoreError};
use crate::{
    models::{
        attempt::{AttemptRecord, RecordedAttempt},
        leaderboard::{LeaderboardEntry, LeaderboardRow, SyncReport},
        profile::Profile,
        progress::{ProgressSummary, SubjectProgress, TopicProgress, TopicTaskProgress, percentage},
        task::{Subject, Task, Topic},
    },
    scoring::ScoringPolicy,
};

const TASK_COLUMNS: &str =
    "id, subject_id, topic_id, question, options, correct_answer, difficulty, position";

const ATTEMPT_COLUMNS: &str =
    "id, user_id, task_id, attempts, is_solved, points_earned, created_at, updated_at";

/// Maps driver errors onto the storage taxonomy.
///
/// Serialization failures, deadlocks and lock timeouts are retryable
/// conflicts. A foreign key violation can only come from an unknown user,
/// since the task was loaded beforehand.
fn classify(err: sqlx::Error, user_id: Option<i64>) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            Some("40001") | Some("40P01") | Some("55P03") => return StoreError::Conflict,
            Some("23503") => {
                if let Some(id) = user_id {
                    return StoreError::UnknownUser(id);
                }
            }
            _ => {}
        }
    }
    tracing::error!("Storage error: {:?}", err);
    StoreError::Unavailable(err.to_string())
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        classify(err, None)
    }
}

/// [`ScoreStore`] backed by Postgres.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get-or-create followed by a locking read.
    ///
    /// `ON CONFLICT DO NOTHING` makes a concurrent creator wait for the first
    /// insert to commit; the `FOR UPDATE` read then sees that row and holds it
    /// until the transaction ends.
    async fn lock_attempt(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
        task_id: i64,
    ) -> Result<AttemptRecord, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO task_attempts (user_id, task_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, task_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(task_id)
        .execute(&mut **tx)
        .await?;

        sqlx::query_as::<_, AttemptRecord>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM task_attempts WHERE user_id = $1 AND task_id = $2 FOR UPDATE"
        ))
        .bind(user_id)
        .bind(task_id)
        .fetch_one(&mut **tx)
        .await
    }

    async fn apply_submission(
        &self,
        user_id: i64,
        task: &Task,
        is_correct: bool,
        policy: &ScoringPolicy,
    ) -> Result<RecordedAttempt, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let mut record = Self::lock_attempt(&mut tx, user_id, task.id).await?;
        let was_solved = record.is_solved;
        let points_awarded = record.record_attempt(is_correct, task.difficulty, policy, Utc::now());

        // A solved record is terminal; nothing to write for it.
        if !was_solved {
            record = sqlx::query_as::<_, AttemptRecord>(&format!(
                r#"
                UPDATE task_attempts
                SET attempts = $1, is_solved = $2, points_earned = $3, updated_at = NOW()
                WHERE id = $4
                RETURNING {ATTEMPT_COLUMNS}
                "#
            ))
            .bind(record.attempts)
            .bind(record.is_solved)
            .bind(record.points_earned)
            .bind(record.id)
            .fetch_one(&mut *tx)
            .await?;
        }

        let mut xp = None;
        if points_awarded > 0 {
            let total: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO user_profiles (user_id, xp, updated_at)
                VALUES ($1, $2, NOW())
                ON CONFLICT (user_id) DO UPDATE
                SET xp = user_profiles.xp + EXCLUDED.xp, updated_at = NOW()
                RETURNING xp
                "#,
            )
            .bind(user_id)
            .bind(i64::from(points_awarded))
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO leaderboard_entries (user_id, points, updated_at)
                VALUES ($1, $2, NOW())
                ON CONFLICT (user_id) DO UPDATE
                SET points = EXCLUDED.points, updated_at = NOW()
                "#,
            )
            .bind(user_id)
            .bind(total)
            .execute(&mut *tx)
            .await?;

            xp = Some(total);
        }

        tx.commit().await?;

        Ok(RecordedAttempt {
            record,
            points_awarded,
            xp,
        })
    }
}

#[async_trait]
impl ScoreStore for PgStore {
    async fn find_task(&self, task_id: i64) -> Result<Option<Task>, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn list_subjects(&self) -> Result<Vec<Subject>, StoreError> {
        let subjects = sqlx::query_as::<_, Subject>(
            "SELECT id, title, icon, color FROM subjects ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(subjects)
    }

    async fn list_topic_tasks(&self, topic_id: i64) -> Result<Vec<Task>, StoreError> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE topic_id = $1 ORDER BY position, id"
        ))
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    async fn record_submission(
        &self,
        user_id: i64,
        task: &Task,
        is_correct: bool,
        policy: &ScoringPolicy,
    ) -> Result<RecordedAttempt, StoreError> {
        // Dropping an uncommitted transaction rolls it back.
        self.apply_submission(user_id, task, is_correct, policy)
            .await
            .map_err(|e| classify(e, Some(user_id)))
    }

    async fn attempt(
        &self,
        user_id: i64,
        task_id: i64,
    ) -> Result<Option<AttemptRecord>, StoreError> {
        let record = sqlx::query_as::<_, AttemptRecord>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM task_attempts WHERE user_id = $1 AND task_id = $2"
        ))
        .bind(user_id)
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn profile(&self, user_id: i64) -> Result<Option<Profile>, StoreError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT user_id, xp, streak, updated_at FROM user_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn leaderboard_entry(
        &self,
        user_id: i64,
    ) -> Result<Option<LeaderboardEntry>, StoreError> {
        let entry = sqlx::query_as::<_, LeaderboardEntry>(
            "SELECT user_id, points, updated_at FROM leaderboard_entries WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn rank_of(&self, user_id: i64) -> Result<Option<i64>, StoreError> {
        let rank: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT 1 + (SELECT COUNT(*) FROM leaderboard_entries o WHERE o.points > e.points)
            FROM leaderboard_entries e
            WHERE e.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rank)
    }

    async fn top(&self, limit: i64) -> Result<Vec<LeaderboardRow>, StoreError> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(
            r#"
            SELECT e.user_id, u.username, e.points, e.updated_at
            FROM leaderboard_entries e
            JOIN users u ON e.user_id = u.id
            ORDER BY e.points DESC, e.updated_at ASC, e.user_id ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn sync_leaderboard(&self) -> Result<SyncReport, StoreError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query(
            r#"
            INSERT INTO leaderboard_entries (user_id, points, updated_at)
            SELECT p.user_id, p.xp, NOW()
            FROM user_profiles p
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let updated = sqlx::query(
            r#"
            UPDATE leaderboard_entries e
            SET points = p.xp, updated_at = NOW()
            FROM user_profiles p
            WHERE e.user_id = p.user_id AND e.points <> p.xp
            "#,
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        Ok(SyncReport { created, updated })
    }

    async fn progress(
        &self,
        user_id: i64,
        subject_id: Option<i64>,
    ) -> Result<ProgressSummary, StoreError> {
        let (total, solved): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE a.is_solved)
            FROM task_attempts a
            JOIN tasks t ON a.task_id = t.id
            WHERE a.user_id = $1 AND ($2::BIGINT IS NULL OR t.subject_id = $2)
            "#,
        )
        .bind(user_id)
        .bind(subject_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ProgressSummary::new(total, solved))
    }

    async fn subject_progress(&self, user_id: i64) -> Result<Vec<SubjectProgress>, StoreError> {
        let rows: Vec<(i64, String, String, String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT
                s.id, s.title, s.icon, s.color,
                COUNT(t.id),
                COUNT(a.id) FILTER (WHERE a.is_solved)
            FROM subjects s
            LEFT JOIN tasks t ON t.subject_id = s.id
            LEFT JOIN task_attempts a ON a.task_id = t.id AND a.user_id = $1
            GROUP BY s.id, s.title, s.icon, s.color
            ORDER BY s.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, title, icon, color, total, solved)| SubjectProgress {
                subject_id: id,
                subject_title: title,
                subject_icon: icon,
                subject_color: color,
                total_tasks: total,
                completed_tasks: solved,
                progress_percentage: percentage(solved, total),
            })
            .collect())
    }

    async fn topic_progress(
        &self,
        user_id: i64,
        topic_id: i64,
    ) -> Result<Option<TopicProgress>, StoreError> {
        let Some(topic) = sqlx::query_as::<_, Topic>(
            "SELECT id, subject_id, title, position, is_locked FROM topics WHERE id = $1",
        )
        .bind(topic_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let rows: Vec<(i64, String, i32, Option<bool>, Option<i32>)> = sqlx::query_as(
            r#"
            SELECT t.id, t.question, t.position, a.is_solved, a.attempts
            FROM tasks t
            LEFT JOIN task_attempts a ON a.task_id = t.id AND a.user_id = $1
            WHERE t.topic_id = $2
            ORDER BY t.position, t.id
            "#,
        )
        .bind(user_id)
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?;

        let tasks = rows
            .into_iter()
            .map(|(task_id, question, position, is_solved, attempts)| TopicTaskProgress {
                task_id,
                question,
                position,
                is_solved: is_solved.unwrap_or(false),
                attempts: attempts.unwrap_or(0),
            })
            .collect();

        Ok(Some(TopicProgress::new(topic.id, topic.title, tasks)))
    }
}
