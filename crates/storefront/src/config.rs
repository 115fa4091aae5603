//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `SESSION_SECRET` - Session signing secret (min 32 chars)
//! - `PAYMENTS_SECRET_KEY` - Payment processor server-side key
//! - `PAYMENTS_WEBHOOK_SECRET` - Webhook signing secret
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `PAYMENTS_API_BASE` - Processor API base (default: <https://api.stripe.com>)
//! - `PAYMENTS_CURRENCY` - ISO currency code for checkout (default: usd)
//! - `SMTP_URL` - Mail transport URL; unset means log-only mail
//! - `MAIL_FROM` - From address for notifications
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::IpAddr;

use lettre::message::Mailbox;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
];

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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Payment processor configuration
    pub payments: PaymentsConfig,
    /// Outbound mail configuration
    pub mail: MailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Payment processor configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct PaymentsConfig {
    /// Processor API base URL
    pub api_base: String,
    /// Server-side API key
    pub secret_key: SecretString,
    /// Webhook signing secret
    pub webhook_secret: SecretString,
    /// ISO currency code used for checkout sessions
    pub currency: String,
}

impl std::fmt::Debug for PaymentsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentsConfig")
            .field("api_base", &self.api_base)
            .field("secret_key", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .field("currency", &self.currency)
            .finish()
    }
}

impl PaymentsConfig {
    /// Whether the configured key is a test-mode key.
    #[must_use]
    pub fn test_mode(&self) -> bool {
        self.secret_key.expose_secret().contains("_test_")
    }
}

/// Outbound mail configuration.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// SMTP transport URL; `None` means log-only delivery.
    pub smtp_url: Option<String>,
    /// From address for all notifications.
    pub from: Mailbox,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if the session secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = SecretString::from(require("DATABASE_URL")?);
        let base_url = require("STOREFRONT_BASE_URL")?;

        let host = parse_optional("STOREFRONT_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = parse_optional("STOREFRONT_PORT", 3000)?;

        let session_secret = validated_secret("SESSION_SECRET")?;

        let payments = PaymentsConfig {
            api_base: optional("PAYMENTS_API_BASE")
                .unwrap_or_else(|| "https://api.stripe.com".to_owned()),
            secret_key: SecretString::from(require("PAYMENTS_SECRET_KEY")?),
            webhook_secret: SecretString::from(require("PAYMENTS_WEBHOOK_SECRET")?),
            currency: optional("PAYMENTS_CURRENCY").unwrap_or_else(|| "usd".to_owned()),
        };

        let mail = MailConfig {
            smtp_url: optional("SMTP_URL"),
            from: optional("MAIL_FROM")
                .unwrap_or_else(|| "Prickly Pear <orders@pricklypear.shop>".to_owned())
                .parse()
                .map_err(|e| {
                    ConfigError::InvalidEnvVar("MAIL_FROM".to_owned(), format!("{e}"))
                })?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            payments,
            mail,
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

/// Load and validate a secret that must not be a placeholder.
pub(crate) fn validated_secret(name: &str) -> Result<SecretString, ConfigError> {
    let value = require(name)?;

    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            name.to_owned(),
            format!("must be at least {MIN_SESSION_SECRET_LENGTH} characters"),
        ));
    }

    let lowered = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS
        .iter()
        .find(|pattern| lowered.contains(*pattern))
    {
        return Err(ConfigError::InsecureSecret(
            name.to_owned(),
            format!("looks like a placeholder ({pattern})"),
        ));
    }

    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, unsafe_code)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_secret_rejected() {
        // Long enough, but obviously a placeholder.
        unsafe {
            std::env::set_var("TEST_SECRET_A", "changeme-changeme-changeme-changeme");
        }
        assert!(matches!(
            validated_secret("TEST_SECRET_A"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
    }

    #[test]
    fn test_short_secret_rejected() {
        unsafe {
            std::env::set_var("TEST_SECRET_B", "short");
        }
        assert!(matches!(
            validated_secret("TEST_SECRET_B"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
    }

    #[test]
    fn test_good_secret_accepted() {
        unsafe {
            std::env::set_var("TEST_SECRET_C", "kT9qLm2xWv8pRn4sJd6hFb1cZy3aGu5e");
        }
        assert!(validated_secret("TEST_SECRET_C").is_ok());
    }
}
