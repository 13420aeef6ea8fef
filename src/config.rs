// src/config.rs

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

use crate::models::timer::RemainingTime;
use crate::session::{Cadences, RetryPolicy};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub question_service_url: String,
    pub bind_address: SocketAddr,
    pub cors_origins: Vec<String>,
    pub rust_log: String,
    pub session: SessionConfig,
    /// Problems found while reading the environment. Logged by the caller
    /// once tracing is up.
    pub warnings: Vec<String>,
}

/// Timing of a running exam session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Countdown used when no timer has been stored for the session yet.
    pub default_duration: RemainingTime,
    pub cadences: Cadences,
    pub retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_duration: RemainingTime::default(),
            cadences: Cadences::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();
        let mut warnings = Vec::new();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let question_service_url = env::var("QUESTION_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());

        let bind_address = env_or("BIND_ADDRESS", SocketAddr::from(([0, 0, 0, 0], 3000)), &mut warnings);

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let defaults = SessionConfig::default();
        let session = SessionConfig {
            default_duration: RemainingTime::from_duration(Duration::from_secs(env_or(
                "DEFAULT_EXAM_SECS",
                defaults.default_duration.total_seconds(),
                &mut warnings,
            ))),
            cadences: Cadences {
                tick: defaults.cadences.tick,
                timer_sync: Duration::from_secs(env_or(
                    "TIMER_SYNC_SECS",
                    defaults.cadences.timer_sync.as_secs(),
                    &mut warnings,
                )),
                draft_autosave: Duration::from_secs(env_or(
                    "DRAFT_AUTOSAVE_SECS",
                    defaults.cadences.draft_autosave.as_secs(),
                    &mut warnings,
                )),
            },
            retry: RetryPolicy {
                max_attempts: env_or(
                    "SAVE_MAX_ATTEMPTS",
                    defaults.retry.max_attempts,
                    &mut warnings,
                ),
                ..defaults.retry
            },
        };

        Self {
            database_url,
            question_service_url,
            bind_address,
            cors_origins,
            rust_log,
            session,
            warnings,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T, warnings: &mut Vec<String>) -> T {
    parse_or(name, env::var(name).ok(), default, warnings)
}

/// Parses an optional raw value, recording a warning and falling back on bad input.
fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T, warnings: &mut Vec<String>) -> T {
    match raw {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warnings.push(format!("Ignoring invalid value {:?} for {}", raw, name));
            default
        }),
        None => default,
    }
}
