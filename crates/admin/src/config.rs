//! Staff panel configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string (same database as the
//!   storefront)
//! - `SESSION_SECRET` - Session signing secret (min 32 chars)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `PAYMENTS_SECRET_KEY` - Used only to decide whether processor
//!   dashboard links point at the test path
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::IpAddr;

use secrecy::SecretString;
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Staff panel application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Whether processor dashboard links use the test path
    pub payments_test_mode: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if the session secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = SecretString::from(require("DATABASE_URL")?);

        let host = parse_optional("ADMIN_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = parse_optional("ADMIN_PORT", 3001)?;

        let session_secret = validated_secret("SESSION_SECRET")?;

        let payments_test_mode = optional("PAYMENTS_SECRET_KEY")
            .is_none_or(|key| key.contains("_test_"));

        Ok(Self {
            database_url,
            host,
            port,
            session_secret,
            payments_test_mode,
            sentry_dsn: optional("SENTRY_DSN"),
        })
    }
}

fn require(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn parse_optional<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match optional(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| ConfigError::InvalidEnvVar(name.to_owned(), format!("{e}"))),
        None => Ok(default),
    }
}

fn validated_secret(name: &str) -> Result<SecretString, ConfigError> {
    let value = require(name)?;

    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            name.to_owned(),
            format!("must be at least {MIN_SESSION_SECRET_LENGTH} characters"),
        ));
    }

    Ok(SecretString::from(value))
}
