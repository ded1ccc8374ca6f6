// src/bin/sync_leaderboard.rs

//! Rebuilds the leaderboard projection from user profiles.

use exam_scoring::{
    config::Config,
    store::{PgStore, ScoreStore},
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.rust_log))
        .with_target(false)
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await?;

    let store = PgStore::new(pool);
    let report = store.sync_leaderboard().await?;

    tracing::info!(
        "Leaderboard synced: {} created, {} updated",
        report.created,
        report.updated
    );
    Ok(())
}
