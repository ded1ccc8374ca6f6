// src/handlers/leaderboard.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    extractors::AppQuery,
    models::leaderboard::{LeaderboardParams, LeaderboardResponse},
    store::ScoreStore,
    utils::jwt::Caller,
};

/// Retrieves the top of the leaderboard.
///
/// When the caller is authenticated, their own rank is included.
#[utoipa::path(
    get,
    path = "/api/leaderboard",
    params(LeaderboardParams),
    responses(
        (status = 200, body = LeaderboardResponse),
        (status = 400, description = "Limit outside 1..=LEADERBOARD_LIMIT")
    )
)]
pub async fn get_leaderboard(
    State(store): State<Arc<dyn ScoreStore>>,
    State(config): State<Config>,
    Caller(user_id): Caller,
    AppQuery(params): AppQuery<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    params
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let limit = params.limit.unwrap_or(config.leaderboard_limit);
    if limit > config.leaderboard_limit {
        return Err(AppError::BadRequest(format!(
            "limit must be at most {}",
            config.leaderboard_limit
        )));
    }

    let leaderboard = store.top(limit).await.map_err(|e| {
        tracing::error!("Failed to fetch leaderboard: {:?}", e);
        AppError::from(e)
    })?;

    let user_rank = match user_id {
        Some(id) => store.rank_of(id).await?,
        None => None,
    };

    Ok(Json(LeaderboardResponse {
        leaderboard,
        user_rank,
    }))
}
