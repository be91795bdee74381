use std::{env, fmt::Display, str::FromStr};

use axum::http::HeaderValue;
use thiserror::Error;
use tower_cookies::Key;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("SESSION_SECRET must be at least 64 bytes")]
    SessionSecretTooShort,
}

/// Startup configuration read from the environment (and `.env` through dotenvy).
/// Log format and OTLP export are read by [`crate::telemetry`] directly.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub session_key: Key,
    pub port: u16,
    pub cors_origin: HeaderValue,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let session_key = session_key(&required("SESSION_SECRET")?)?;

        Ok(Self {
            database_url,
            session_key,
            port: try_load("QNNECT_PORT", "8000")?,
            cors_origin: try_load("QNNECT_CORS_ORIGIN", "http://localhost:5173")?,
        })
    }
}

/// Derives the cookie key. The secret is used as raw key material.
pub fn session_key(secret: &str) -> Result<Key, ConfigError> {
    Key::try_from(secret.as_bytes()).map_err(|_| ConfigError::SessionSecretTooShort)
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }
        })
}
