// src/services/submission.rs

use std::sync::Arc;

use crate::{
    config::SubmissionSettings,
    error::ScoringError,
    models::submission::SubmissionResult,
    store::{ScoreStore, StoreError},
    utils::retry::{RetryConfig, retry_if},
};

/// Entry point for answer submissions.
///
/// Validates the request, then runs the atomic scoring step in the store,
/// retrying it a bounded number of times when it loses a lock race.
#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<dyn ScoreStore>,
    settings: SubmissionSettings,
}

impl SubmissionService {
    pub fn new(store: Arc<dyn ScoreStore>, settings: SubmissionSettings) -> Self {
        Self { store, settings }
    }

    /// Records `raw_answer` from `user_id` against `task_id`.
    ///
    /// Rejections (`Unauthenticated`, `InvalidAnswer`, `TaskNotFound`) happen
    /// before any attempt record is touched. Submitting to an already solved
    /// task is not an error: it awards nothing and changes nothing.
    pub async fn submit_answer(
        &self,
        user_id: Option<i64>,
        task_id: i64,
        raw_answer: &str,
    ) -> Result<SubmissionResult, ScoringError> {
        let user_id = user_id.ok_or(ScoringError::Unauthenticated)?;
        let answer = self.validate_answer(raw_answer)?;

        let task = self
            .store
            .find_task(task_id)
            .await?
            .ok_or(ScoringError::TaskNotFound(task_id))?;

        let is_correct = task.is_correct(answer);
        let policy = self.settings.policy;

        let outcome = retry_if(
            RetryConfig::with_attempts(self.settings.retry_attempts),
            |err: &StoreError| {
                let retry = matches!(err, StoreError::Conflict);
                if retry {
                    tracing::warn!(
                        "Submission conflict for user {} on task {}, retrying",
                        user_id,
                        task_id
                    );
                }
                retry
            },
            || self.store.record_submission(user_id, &task, is_correct, &policy),
        )
        .await
        .map_err(|e| {
            tracing::error!(
                "Submission failed for user {} on task {}: {}",
                user_id,
                task_id,
                e
            );
            ScoringError::from(e)
        })?;

        let record = outcome.record;
        if outcome.points_awarded > 0 {
            tracing::info!(
                "User {} solved task {} on attempt {}, earned {} points (xp now {})",
                user_id,
                task_id,
                record.attempts,
                outcome.points_awarded,
                outcome.xp.unwrap_or_default()
            );
        }

        let reveal = is_correct || record.attempts >= self.settings.reveal_after_attempts;

        Ok(SubmissionResult {
            is_correct,
            is_solved: record.is_solved,
            attempts: record.attempts,
            points_awarded: outcome.points_awarded,
            correct_answer: reveal.then(|| task.correct_answer.trim().to_string()),
        })
    }

    /// Trims the answer and checks it is non-empty and short enough.
    pub fn validate_answer<'a>(&self, raw_answer: &'a str) -> Result<&'a str, ScoringError> {
        let answer = raw_answer.trim();
        if answer.is_empty() {
            return Err(ScoringError::InvalidAnswer(
                "Answer must not be empty".to_string(),
            ));
        }

        let max = self.settings.max_answer_chars;
        if answer.chars().count() > max {
            return Err(ScoringError::InvalidAnswer(format!(
                "Answer must be at most {max} characters"
            )));
        }

        Ok(answer)
    }
}
