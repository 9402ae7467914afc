use std::env;
use std::time::Duration;

use crate::relay::{COMMENT_EVENTS, PROFILE_EVENTS};

pub const DEFAULT_AMQP_URL: &str = "amqp://127.0.0.1:5672/%2f";
pub const DEFAULT_FACT_QUEUE: &str = "post_service.facts";
pub const DEFAULT_HANDLER_TIMEOUT_MS: u64 = 5000;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing env: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Process settings of the relay binary, read from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub amqp_url: String,
    pub fact_queue: String,
    pub fact_channels: Vec<String>,
    pub handler_timeout: Duration,
}

impl Settings {
    /// # Errors
    ///
    /// Will return an `Err` if `DATABASE_URL` is missing or any variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout_ms: u64 = parsed_env("RELAY_HANDLER_TIMEOUT_MS", DEFAULT_HANDLER_TIMEOUT_MS)?;
        if timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "RELAY_HANDLER_TIMEOUT_MS",
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            database_url: required_env("DATABASE_URL")?,
            amqp_url: env_or("AMQP_URL", DEFAULT_AMQP_URL),
            fact_queue: env_or("FACT_QUEUE", DEFAULT_FACT_QUEUE),
            fact_channels: channels_from_env("FACT_CHANNELS")?,
            handler_timeout: Duration::from_millis(timeout_ms),
        })
    }
}

pub fn required_env(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed_env(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|err: std::num::ParseIntError| ConfigError::Invalid {
            name,
            reason: err.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn channels_from_env(name: &'static str) -> Result<Vec<String>, ConfigError> {
    let Ok(value) = env::var(name) else {
        return Ok(vec![COMMENT_EVENTS.to_string(), PROFILE_EVENTS.to_string()]);
    };

    let channels: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|channel| !channel.is_empty())
        .map(str::to_string)
        .collect();

    if channels.is_empty() {
        Err(ConfigError::Invalid {
            name,
            reason: "no channel listed".to_string(),
        })
    } else {
        Ok(channels)
    }
}
