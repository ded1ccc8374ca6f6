// src/models/task.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use utoipa::ToSchema;

/// Represents the 'subjects' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Subject {
    pub id: i64,
    pub title: String,
    pub icon: String,
    pub color: String,
}

/// Represents the 'topics' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub subject_id: i64,
    pub title: String,
    pub position: i32,
    pub is_locked: bool,
}

/// Represents the 'tasks' table in the database.
///
/// Read-only from the scoring engine's point of view.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub subject_id: i64,
    pub topic_id: Option<i64>,

    /// The text of the question.
    pub question: String,

    /// Answer options keyed by their token (e.g. "1" -> "Dushanbe").
    /// Stored as a JSON object in the database.
    pub options: Json<BTreeMap<String, String>>,

    /// The token of the correct option, compared after trimming.
    pub correct_answer: String,

    /// Points multiplier, a small positive integer.
    pub difficulty: i32,

    pub position: i32,
}

impl Task {
    /// Exact, case-sensitive comparison of the trimmed forms.
    pub fn is_correct(&self, answer: &str) -> bool {
        answer.trim() == self.correct_answer.trim()
    }
}

/// DTO for sending a task to the client (excludes the correct answer).
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicTask {
    pub id: i64,
    pub subject_id: i64,
    pub topic_id: Option<i64>,
    pub question: String,
    pub options: BTreeMap<String, String>,
    pub difficulty: i32,
}

impl From<Task> for PublicTask {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            subject_id: task.subject_id,
            topic_id: task.topic_id,
            question: task.question,
            options: task.options.0,
            difficulty: task.difficulty,
        }
    }
}
