//! Token Service configuration.
//!
//! Loaded from environment variables. The signing secret is held in a
//! `SecretString` and redacted in Debug output.

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default token lifetime in seconds (24 hours).
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 86_400;

/// Token Service configuration.
#[derive(Clone)]
pub struct TokenConfig {
    /// Numeric application id, written into every token as `iss`.
    pub app_id: u32,

    /// Shared HMAC-SHA256 signing secret.
    /// Protected by `SecretString` to prevent accidental logging.
    pub server_secret: SecretString,

    /// Lifetime of tokens issued without an explicit TTL (default: 86400).
    pub default_ttl_seconds: u64,

    /// Whether validation also recomputes and checks the signature (default: false).
    pub strict_signature: bool,
}

/// Custom Debug implementation that redacts the signing secret.
impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("app_id", &self.app_id)
            .field("server_secret", &"[REDACTED]")
            .field("default_ttl_seconds", &self.default_ttl_seconds)
            .field("strict_signature", &self.strict_signature)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl TokenConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let app_id_raw = vars
            .get("TOKEN_APP_ID")
            .ok_or_else(|| ConfigError::MissingEnvVar("TOKEN_APP_ID".to_string()))?;

        let app_id: u32 = app_id_raw.trim().parse().map_err(|_| {
            ConfigError::InvalidValue("TOKEN_APP_ID must be a positive integer".to_string())
        })?;

        if app_id == 0 {
            return Err(ConfigError::InvalidValue(
                "TOKEN_APP_ID must be non-zero".to_string(),
            ));
        }

        let server_secret = vars
            .get("TOKEN_SERVER_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("TOKEN_SERVER_SECRET".to_string()))?;

        if server_secret.is_empty() {
            // Don't echo the value back, even when empty
            return Err(ConfigError::InvalidValue(
                "TOKEN_SERVER_SECRET must not be empty".to_string(),
            ));
        }

        let default_ttl_seconds = vars
            .get("TOKEN_TTL_SECONDS")
            .and_then(|s| s.parse().ok())
            .filter(|ttl: &u64| *ttl > 0)
            .unwrap_or(DEFAULT_TOKEN_TTL_SECONDS);

        let strict_signature = vars
            .get("TOKEN_STRICT_SIGNATURE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(false);

        Ok(TokenConfig {
            app_id,
            server_secret: SecretString::from(server_secret.clone()),
            default_ttl_seconds,
            strict_signature,
        })
    }
}
