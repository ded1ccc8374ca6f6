// tests/common/mod.rs

#![allow(dead_code)]

use std::{collections::BTreeMap, net::SocketAddr, sync::Arc};

use exam_scoring::{
    config::{Config, DEFAULT_LEADERBOARD_LIMIT, SubmissionSettings},
    models::task::{Subject, Task, Topic},
    routes,
    services::SubmissionService,
    state::AppState,
    store::MemoryStore,
    utils::jwt::sign_jwt,
};
use sqlx::types::Json;

pub const JWT_SECRET: &str = "test_secret_for_integration_tests";

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: JWT_SECRET.to_string(),
        rust_log: "error".to_string(),
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
        submission: SubmissionSettings::default(),
    }
}

pub fn subject(id: i64, title: &str) -> Subject {
    Subject {
        id,
        title: title.to_string(),
        icon: String::new(),
        color: String::new(),
    }
}

pub fn topic(id: i64, subject_id: i64, title: &str) -> Topic {
    Topic {
        id,
        subject_id,
        title: title.to_string(),
        position: 0,
        is_locked: false,
    }
}

pub fn task(id: i64, difficulty: i32, correct_answer: &str) -> Task {
    let options = BTreeMap::from([
        ("1".to_string(), "3".to_string()),
        ("2".to_string(), "4".to_string()),
        ("3".to_string(), "5".to_string()),
    ]);
    Task {
        id,
        subject_id: 1,
        topic_id: Some(1),
        question: format!("Question {id}"),
        options: Json(options),
        correct_answer: correct_answer.to_string(),
        difficulty,
        position: id as i32,
    }
}

/// Store with users 1..=3, one subject and topic, and tasks:
/// 1 (difficulty 2, answer "4"), 2 (difficulty 1, answer "4"),
/// 3 (difficulty 3, answer "B").
pub async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for (id, name) in [(1, "alice"), (2, "bob"), (3, "carol")] {
        store.add_user(id, name).await;
    }
    store.add_subject(subject(1, "Mathematics")).await;
    store.add_subject(subject(2, "History")).await;
    store.add_topic(topic(1, 1, "Arithmetic")).await;
    store.add_task(task(1, 2, "4")).await;
    store.add_task(task(2, 1, "4")).await;
    store.add_task(task(3, 3, "B")).await;
    store
}

pub fn service(store: Arc<MemoryStore>) -> SubmissionService {
    SubmissionService::new(store, SubmissionSettings::default())
}

pub fn token_for(user_id: i64) -> String {
    sign_jwt(user_id, "user", JWT_SECRET, 600).expect("sign test token")
}

/// Spawns the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
pub async fn spawn_app(store: Arc<MemoryStore>) -> String {
    let state = AppState::new(store, test_config());
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}
