//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STITCHDESK_DATABASE_URL` - `PostgreSQL` connection string
//! - `STITCHDESK_BASE_URL` - Public URL for the service
//! - `STITCHDESK_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `FLW_SECRET_KEY` - Payment gateway secret key
//! - `MEDIA_ENDPOINT` - Object storage endpoint URL
//! - `MEDIA_SERVICE_KEY` - Object storage service key
//! - `FCM_SERVER_KEY` - Push dispatch server key
//!
//! ## Optional
//! - `STITCHDESK_HOST` - Bind address (default: 127.0.0.1)
//! - `STITCHDESK_PORT` - Listen port (default: 8080)
//! - `STITCHDESK_SWEEP` - Enable the hourly order sweep (default: true); set
//!   to `false` on platforms without persistent background processes
//! - `FLW_BASE_URL` - Payment gateway API base (default: https://api.flutterwave.com/v3)
//! - `PAYMENT_CURRENCY` - Charge currency (default: NGN)
//! - `MEDIA_BUCKET` - Object storage bucket (default: stitchdesk)
//! - `FCM_ENDPOINT` - Push dispatch endpoint (default: https://fcm.googleapis.com)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

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
    "enter-",
    "put-your",
    "add-your",
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

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the service
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Whether to run the hourly order sweep
    pub sweep_enabled: bool,
    /// Payment gateway configuration
    pub payment: PaymentConfig,
    /// Object storage configuration
    pub media: MediaConfig,
    /// Push dispatch configuration
    pub push: PushConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Payment gateway configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Gateway API base URL
    pub base_url: String,
    /// Gateway secret key (server-side only)
    pub secret_key: SecretString,
    /// Where the gateway redirects the payer after checkout
    pub redirect_url: String,
    /// ISO currency code for subscription charges
    pub currency: String,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("base_url", &self.base_url)
            .field("secret_key", &"[REDACTED]")
            .field("redirect_url", &self.redirect_url)
            .field("currency", &self.currency)
            .finish()
    }
}

/// Object storage configuration.
#[derive(Clone)]
pub struct MediaConfig {
    /// Storage endpoint URL
    pub endpoint: String,
    /// Bucket holding all uploads
    pub bucket: String,
    /// Service key authorizing uploads and deletions
    pub service_key: SecretString,
}

impl std::fmt::Debug for MediaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaConfig")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("service_key", &"[REDACTED]")
            .finish()
    }
}

/// Push dispatch configuration.
#[derive(Clone)]
pub struct PushConfig {
    /// Dispatch endpoint URL
    pub endpoint: String,
    /// Server key authorizing sends
    pub server_key: SecretString,
}

impl std::fmt::Debug for PushConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushConfig")
            .field("endpoint", &self.endpoint)
            .field("server_key", &"[REDACTED]")
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STITCHDESK_DATABASE_URL")?;
        let host = get_env_or_default("STITCHDESK_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STITCHDESK_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STITCHDESK_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STITCHDESK_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STITCHDESK_BASE_URL")?;
        let session_secret = get_validated_secret("STITCHDESK_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STITCHDESK_SESSION_SECRET")?;
        let sweep_enabled = get_env_or_default("STITCHDESK_SWEEP", "true")
            .parse::<bool>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STITCHDESK_SWEEP".to_string(), e.to_string())
            })?;

        let payment = PaymentConfig::from_env(&base_url)?;
        let media = MediaConfig::from_env()?;
        let push = PushConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            sweep_enabled,
            payment,
            media,
            push,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PaymentConfig {
    fn from_env(base_url: &str) -> Result<Self, ConfigError> {
        let default_redirect = format!("{}/subscription/verify", base_url.trim_end_matches('/'));
        Ok(Self {
            base_url: get_env_or_default("FLW_BASE_URL", "https://api.flutterwave.com/v3"),
            secret_key: get_validated_secret("FLW_SECRET_KEY")?,
            redirect_url: get_env_or_default("PAYMENT_REDIRECT_URL", &default_redirect),
            currency: get_env_or_default("PAYMENT_CURRENCY", "NGN"),
        })
    }
}

impl MediaConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: get_required_env("MEDIA_ENDPOINT")?,
            bucket: get_env_or_default("MEDIA_BUCKET", "stitchdesk"),
            service_key: get_validated_secret("MEDIA_SERVICE_KEY")?,
        })
    }
}

impl PushConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: get_env_or_default("FCM_ENDPOINT", "https://fcm.googleapis.com"),
            server_key: get_validated_secret("FCM_SERVER_KEY")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_session_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(result.is_ok());
    }
}
