// src/models/mod.rs

pub mod attempt;
pub mod leaderboard;
pub mod profile;
pub mod progress;
pub mod submission;
pub mod task;
