// src/handlers/progress.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::progress::{ProgressResponse, StatsResponse, TopicProgress},
    store::ScoreStore,
    utils::jwt::Caller,
};

fn require_user(caller: Caller) -> Result<i64, AppError> {
    caller
        .0
        .ok_or(AppError::AuthError("Authentication required".to_string()))
}

/// Per-subject progress of the current user.
#[utoipa::path(
    get,
    path = "/api/progress",
    responses((status = 200, body = ProgressResponse)),
    security(("bearer" = []))
)]
pub async fn get_progress(
    State(store): State<Arc<dyn ScoreStore>>,
    caller: Caller,
) -> Result<impl IntoResponse, AppError> {
    let user_id = require_user(caller)?;

    let progress = store.subject_progress(user_id).await?;
    let profile = store.profile(user_id).await?;

    Ok(Json(ProgressResponse {
        progress,
        total_xp: profile.as_ref().map_or(0, |p| p.xp),
        streak: profile.as_ref().map_or(0, |p| p.streak),
    }))
}

/// Progress of the current user within one topic.
#[utoipa::path(
    get,
    path = "/api/progress/topic/{id}",
    params(("id" = i64, Path, description = "Topic id")),
    responses(
        (status = 200, body = TopicProgress),
        (status = 404, description = "Topic not found")
    ),
    security(("bearer" = []))
)]
pub async fn get_topic_progress(
    State(store): State<Arc<dyn ScoreStore>>,
    caller: Caller,
    Path(topic_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = require_user(caller)?;

    let progress = store
        .topic_progress(user_id, topic_id)
        .await?
        .ok_or(AppError::NotFound("Topic not found".to_string()))?;

    Ok(Json(progress))
}

/// Aggregate statistics of the current user.
#[utoipa::path(
    get,
    path = "/api/stats",
    responses((status = 200, body = StatsResponse)),
    security(("bearer" = []))
)]
pub async fn get_stats(
    State(store): State<Arc<dyn ScoreStore>>,
    caller: Caller,
) -> Result<impl IntoResponse, AppError> {
    let user_id = require_user(caller)?;

    let summary = store.progress(user_id, None).await?;
    let subjects_stats = store
        .subject_progress(user_id)
        .await?
        .into_iter()
        .filter(|s| s.total_tasks > 0)
        .collect();
    let total_xp = store.profile(user_id).await?.map_or(0, |p| p.xp);
    let leaderboard_rank = store.rank_of(user_id).await?;

    Ok(Json(StatsResponse {
        total_xp,
        total_solved: summary.solved,
        total_attempts: summary.total_attempts,
        percentage: summary.percentage,
        subjects_stats,
        leaderboard_rank,
    }))
}
