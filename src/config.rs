// src/config.rs

use std::{env, net::SocketAddr, str::FromStr};

use dotenvy::dotenv;
use thiserror::Error;

use crate::scoring::ScoringPolicy;

pub const DEFAULT_BASE_MULTIPLIER: i32 = 5;
pub const DEFAULT_SECOND_ATTEMPT_PERCENT: i32 = 70;
pub const DEFAULT_LATER_ATTEMPT_PERCENT: i32 = 50;

/// Failed attempts after which the correct answer is disclosed.
pub const DEFAULT_REVEAL_AFTER_ATTEMPTS: i32 = 3;
pub const DEFAULT_MAX_ANSWER_CHARS: usize = 100;
pub const DEFAULT_SUBMIT_RETRY_ATTEMPTS: usize = 3;
pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an unparsable value {value:?}")]
    Unparsable { name: &'static str, value: String },

    #[error("{name} is out of range: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Knobs of the answer-submission flow.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionSettings {
    pub policy: ScoringPolicy,
    pub reveal_after_attempts: i32,
    pub max_answer_chars: usize,
    pub retry_attempts: usize,
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self {
            policy: ScoringPolicy::default(),
            reveal_after_attempts: DEFAULT_REVEAL_AFTER_ATTEMPTS,
            max_answer_chars: DEFAULT_MAX_ANSWER_CHARS,
            retry_attempts: DEFAULT_SUBMIT_RETRY_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub leaderboard_limit: i64,
    pub submission: SubmissionSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let policy = ScoringPolicy {
            base_multiplier: parsed("SCORE_BASE_MULTIPLIER", DEFAULT_BASE_MULTIPLIER)?,
            second_attempt_percent: parsed(
                "SCORE_SECOND_ATTEMPT_PERCENT",
                DEFAULT_SECOND_ATTEMPT_PERCENT,
            )?,
            later_attempt_percent: parsed(
                "SCORE_LATER_ATTEMPT_PERCENT",
                DEFAULT_LATER_ATTEMPT_PERCENT,
            )?,
        };

        let config = Self {
            database_url,
            jwt_secret,
            rust_log,
            bind_addr: parsed("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            leaderboard_limit: parsed("LEADERBOARD_LIMIT", DEFAULT_LEADERBOARD_LIMIT)?,
            submission: SubmissionSettings {
                policy,
                reveal_after_attempts: parsed(
                    "REVEAL_AFTER_ATTEMPTS",
                    DEFAULT_REVEAL_AFTER_ATTEMPTS,
                )?,
                max_answer_chars: parsed("MAX_ANSWER_CHARS", DEFAULT_MAX_ANSWER_CHARS)?,
                retry_attempts: parsed("SUBMIT_RETRY_ATTEMPTS", DEFAULT_SUBMIT_RETRY_ATTEMPTS)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that the parser cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let policy = &self.submission.policy;
        if policy.base_multiplier <= 0 {
            return Err(invalid("SCORE_BASE_MULTIPLIER", "must be positive"));
        }
        for (name, percent) in [
            ("SCORE_SECOND_ATTEMPT_PERCENT", policy.second_attempt_percent),
            ("SCORE_LATER_ATTEMPT_PERCENT", policy.later_attempt_percent),
        ] {
            if !(0..=100).contains(&percent) {
                return Err(invalid(name, "must be between 0 and 100"));
            }
        }
        if self.submission.reveal_after_attempts <= 0 {
            return Err(invalid("REVEAL_AFTER_ATTEMPTS", "must be positive"));
        }
        if self.submission.max_answer_chars == 0 {
            return Err(invalid("MAX_ANSWER_CHARS", "must be positive"));
        }
        if self.submission.retry_attempts == 0 {
            return Err(invalid("SUBMIT_RETRY_ATTEMPTS", "must be positive"));
        }
        if self.leaderboard_limit <= 0 {
            return Err(invalid("LEADERBOARD_LIMIT", "must be positive"));
        }
        Ok(())
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Unparsable { name, value }),
        Err(_) => Ok(default),
    }
}

fn invalid(name: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            database_url: "postgres://localhost/test".to_string(),
            jwt_secret: "secret".to_string(),
            rust_log: "error".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
            submission: SubmissionSettings::default(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn percent_above_hundred_is_rejected() {
        let mut config = sample();
        config.submission.policy.second_attempt_percent = 120;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "SCORE_SECOND_ATTEMPT_PERCENT",
                ..
            }
        ));
    }

    #[test]
    fn zero_retry_attempts_is_rejected() {
        let mut config = sample();
        config.submission.retry_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unset_variable_falls_back_to_default() {
        let value: i32 = parsed("EXAM_SCORING_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
