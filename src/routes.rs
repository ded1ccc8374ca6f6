// src/routes.rs

use axum::{
    Json, Router,
    http::Method,
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{
    handlers::{self, leaderboard, progress, tasks},
    models,
    state::AppState,
    utils::jwt::{auth_middleware, optional_auth_middleware},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        tasks::list_subjects,
        tasks::get_task,
        tasks::list_topic_tasks,
        tasks::submit_answer,
        leaderboard::get_leaderboard,
        progress::get_progress,
        progress::get_topic_progress,
        progress::get_stats,
    ),
    components(schemas(
        models::task::Subject,
        models::task::PublicTask,
        models::submission::SubmitAnswerRequest,
        models::submission::SubmitAnswerResponse,
        models::leaderboard::LeaderboardRow,
        models::leaderboard::LeaderboardResponse,
        models::progress::SubjectProgress,
        models::progress::TopicTaskProgress,
        models::progress::TopicProgress,
        models::progress::ProgressResponse,
        models::progress::StatsResponse,
    )),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Assembles the main application router.
///
/// * Public catalog and leaderboard routes (caller identity optional).
/// * Answer submission, where the orchestrator rejects anonymous callers.
/// * Progress routes that require a valid token.
/// * Global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let public_routes = Router::new()
        .route("/subjects", get(tasks::list_subjects))
        .route("/tasks/{id}", get(tasks::get_task))
        .route("/topics/{id}/tasks", get(tasks::list_topic_tasks))
        .route("/tasks/{id}/submit", post(tasks::submit_answer))
        .route("/leaderboard", get(leaderboard::get_leaderboard))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    let protected_routes = Router::new()
        .route("/progress", get(progress::get_progress))
        .route("/progress/topic/{id}", get(progress::get_topic_progress))
        .route("/stats", get(progress::get_stats))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/api/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .nest("/api", public_routes.merge(protected_routes))
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_submit_route() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert!(doc["paths"]["/api/tasks/{id}/submit"]["post"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearer"].is_object());
    }
}
