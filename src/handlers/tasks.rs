// src/handlers/tasks.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    extractors::AppJson,
    models::{
        submission::{SubmitAnswerRequest, SubmitAnswerResponse},
        task::{PublicTask, Subject},
    },
    services::SubmissionService,
    store::ScoreStore,
    utils::jwt::Caller,
};

/// Lists all subjects of the catalog.
#[utoipa::path(
    get,
    path = "/api/subjects",
    responses((status = 200, body = [Subject]))
)]
pub async fn list_subjects(
    State(store): State<Arc<dyn ScoreStore>>,
) -> Result<impl IntoResponse, AppError> {
    let subjects = store.list_subjects().await?;
    Ok(Json(subjects))
}

/// Retrieves a single task, without its correct answer.
#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, body = PublicTask),
        (status = 404, description = "Task not found")
    )
)]
pub async fn get_task(
    State(store): State<Arc<dyn ScoreStore>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let task = store
        .find_task(id)
        .await?
        .ok_or(AppError::NotFound("Task not found".to_string()))?;

    Ok(Json(PublicTask::from(task)))
}

/// Lists the tasks of a topic in display order.
#[utoipa::path(
    get,
    path = "/api/topics/{id}/tasks",
    params(("id" = i64, Path, description = "Topic id")),
    responses((status = 200, body = [PublicTask]))
)]
pub async fn list_topic_tasks(
    State(store): State<Arc<dyn ScoreStore>>,
    Path(topic_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let tasks: Vec<PublicTask> = store
        .list_topic_tasks(topic_id)
        .await?
        .into_iter()
        .map(PublicTask::from)
        .collect();

    Ok(Json(tasks))
}

/// Submits an answer to a task.
///
/// * Anonymous callers are rejected with 401.
/// * Awards points only on the transition to solved.
/// * Reveals the correct answer once solved or after enough failed tries.
#[utoipa::path(
    post,
    path = "/api/tasks/{id}/submit",
    params(("id" = i64, Path, description = "Task id")),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, body = SubmitAnswerResponse),
        (status = 400, description = "Malformed body, empty or oversized answer"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Task not found"),
        (status = 503, description = "Storage unavailable or persistent conflict")
    ),
    security(("bearer" = []))
)]
pub async fn submit_answer(
    State(submissions): State<SubmissionService>,
    Caller(user_id): Caller,
    Path(task_id): Path<i64>,
    AppJson(req): AppJson<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let answer = req.answer.unwrap_or_default();
    let result = submissions.submit_answer(user_id, task_id, &answer).await?;

    Ok(Json(SubmitAnswerResponse::from(result)))
}
