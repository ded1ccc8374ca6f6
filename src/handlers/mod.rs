// src/handlers/mod.rs

pub mod leaderboard;
pub mod progress;
pub mod tasks;

use axum::{Json, response::IntoResponse};

/// Liveness probe.
#[utoipa::path(get, path = "/api/health", responses((status = 200)))]
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
