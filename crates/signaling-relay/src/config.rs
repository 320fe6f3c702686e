//! Signaling server configuration.
//!
//! Configuration is loaded from environment variables. The token settings
//! are delegated to [`TokenConfig`], which keeps the signing secret redacted.

use crate::tasks::session_reaper::{
    DEFAULT_REAPER_INTERVAL_SECONDS, DEFAULT_SESSION_MAX_AGE_SECONDS,
};
use std::collections::HashMap;
use std::env;
use thiserror::Error;
use token_service::config::{ConfigError as TokenConfigError, TokenConfig};

/// Default HTTP/WebSocket bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Signaling server configuration.
///
/// `Debug` is derived: the only secret lives in `token`, whose own `Debug`
/// redacts it.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP/WebSocket listener (default: "0.0.0.0:3000").
    pub bind_address: String,

    /// Reaper sweep interval in seconds (default: 3600).
    pub reaper_interval_seconds: u64,

    /// Age after which an empty session is reaped, in seconds (default: 86400).
    pub session_max_age_seconds: u64,

    /// Require a valid `token` query parameter on `/ws` (default: false).
    pub require_token: bool,

    /// Token issuance and validation settings.
    pub token: TokenConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl From<TokenConfigError> for ConfigError {
    fn from(err: TokenConfigError) -> Self {
        match err {
            TokenConfigError::MissingEnvVar(var) => ConfigError::MissingEnvVar(var),
            TokenConfigError::InvalidValue(msg) => ConfigError::InvalidValue(msg),
        }
    }
}

fn parse_or<T: std::str::FromStr>(vars: &HashMap<String, String>, key: &str, default: T) -> T {
    vars.get(key).and_then(|s| s.parse().ok()).unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let token = TokenConfig::from_vars(vars)?;

        let bind_address = vars
            .get("RELAY_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let reaper_interval_seconds = parse_or(
            vars,
            "RELAY_REAPER_INTERVAL_SECONDS",
            DEFAULT_REAPER_INTERVAL_SECONDS,
        );
        if reaper_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "RELAY_REAPER_INTERVAL_SECONDS must be greater than zero".to_string(),
            ));
        }

        let session_max_age_seconds = parse_or(
            vars,
            "RELAY_SESSION_MAX_AGE_SECONDS",
            DEFAULT_SESSION_MAX_AGE_SECONDS,
        );

        let require_token = parse_or(vars, "RELAY_REQUIRE_TOKEN", false);

        Ok(Config {
            bind_address,
            reaper_interval_seconds,
            session_max_age_seconds,
            require_token,
            token,
        })
    }
}
