// src/models/submission.rs

use serde::{Deserialize, Deserializer, Serialize, de};
use utoipa::ToSchema;

/// DTO for submitting an answer to a task.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitAnswerRequest {
    /// The chosen option token. A missing field is treated as an empty answer;
    /// numeric tokens are accepted and compared in their decimal form.
    #[serde(default, deserialize_with = "string_or_number")]
    #[schema(value_type = Option<String>)]
    pub answer: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(de::Error::custom(format!(
            "answer must be a string or a number, got {other}"
        ))),
    }
}

/// What the orchestrator reports back for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub is_correct: bool,
    pub is_solved: bool,
    pub attempts: i32,
    pub points_awarded: i32,

    /// Present when the answer was correct or enough attempts were spent.
    pub correct_answer: Option<String>,
}

impl SubmissionResult {
    /// User-facing summary. Only asks for another try when one can still
    /// change the outcome.
    pub fn message(&self) -> &'static str {
        match (self.is_correct, self.is_solved, self.correct_answer.is_some()) {
            (true, _, _) => "Correct!",
            (false, true, _) => "Incorrect, but this task is already solved",
            (false, false, true) => "Incorrect, the correct answer is shown",
            (false, false, false) => "Incorrect, try again",
        }
    }
}

/// JSON body returned by the submit endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitAnswerResponse {
    pub success: bool,
    pub is_correct: bool,
    pub is_solved: bool,
    pub attempts: i32,
    pub points_earned: i32,
    pub correct_answer: Option<String>,
    pub message: String,
}

impl From<SubmissionResult> for SubmitAnswerResponse {
    fn from(result: SubmissionResult) -> Self {
        let message = result.message().to_string();

        Self {
            success: true,
            is_correct: result.is_correct,
            is_solved: result.is_solved,
            attempts: result.attempts,
            points_earned: result.points_awarded,
            correct_answer: result.correct_answer,
            message,
        }
    }
}
