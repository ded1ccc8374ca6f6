// src/models/progress.rs

use serde::Serialize;
use utoipa::ToSchema;

/// Integer percentage, 0 when there is nothing to complete.
pub fn percentage(done: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    done * 100 / total
}

/// Attempt records touched vs. solved, optionally scoped to one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProgressSummary {
    pub total_attempts: i64,
    pub solved: i64,
    pub percentage: i64,
}

impl ProgressSummary {
    pub fn new(total_attempts: i64, solved: i64) -> Self {
        Self {
            total_attempts,
            solved,
            percentage: percentage(solved, total_attempts),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubjectProgress {
    pub subject_id: i64,
    pub subject_title: String,
    pub subject_icon: String,
    pub subject_color: String,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub progress_percentage: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TopicTaskProgress {
    pub task_id: i64,
    pub question: String,
    pub position: i32,
    pub is_solved: bool,
    pub attempts: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TopicProgress {
    pub topic_id: i64,
    pub topic_title: String,
    pub tasks: Vec<TopicTaskProgress>,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub progress_percentage: i64,
}

impl TopicProgress {
    pub fn new(topic_id: i64, topic_title: String, tasks: Vec<TopicTaskProgress>) -> Self {
        let total_tasks = tasks.len() as i64;
        let completed_tasks = tasks.iter().filter(|t| t.is_solved).count() as i64;
        Self {
            topic_id,
            topic_title,
            tasks,
            total_tasks,
            completed_tasks,
            progress_percentage: percentage(completed_tasks, total_tasks),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProgressResponse {
    pub progress: Vec<SubjectProgress>,
    pub total_xp: i64,
    pub streak: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub total_xp: i64,
    pub total_solved: i64,
    pub total_attempts: i64,
    pub percentage: i64,
    pub subjects_stats: Vec<SubjectProgress>,
    pub leaderboard_rank: Option<i64>,
}
