// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, services::SubmissionService, store::ScoreStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ScoreStore>,
    pub config: Config,
    pub submissions: SubmissionService,
}

impl AppState {
    pub fn new(store: Arc<dyn ScoreStore>, config: Config) -> Self {
        let submissions = SubmissionService::new(store.clone(), config.submission);
        Self {
            store,
            config,
            submissions,
        }
    }
}

impl FromRef<AppState> for Arc<dyn ScoreStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for SubmissionService {
    fn from_ref(state: &AppState) -> Self {
        state.submissions.clone()
    }
}
