//! Hub service configuration.
//!
//! Configuration is loaded from environment variables. The JWT secret is
//! required and redacted in Debug output.

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default bind address for the WebSocket endpoint and health probes.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:4000";

/// Default per-session outbound channel capacity.
///
/// When a session's channel is full, further deliveries to it are dropped
/// (best-effort contract); the channel is sized so that only a genuinely
/// stalled client hits that path.
pub const DEFAULT_SESSION_CHANNEL_BUFFER: usize = 64;

/// Hub service configuration.
///
/// Loaded from environment variables with sensible defaults.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:4000").
    pub bind_address: String,

    /// HS256 secret used to verify connection credential tokens.
    /// Protected by `SecretString` to prevent accidental logging.
    pub jwt_secret: SecretString,

    /// Per-session outbound channel capacity (default: 64).
    pub session_channel_buffer: usize,

    /// Optional JSON file used to seed the in-memory user directory
    /// (development convenience; registration is out of scope for the hub).
    pub seed_users_path: Option<String>,
}

/// Custom Debug implementation that redacts the JWT secret.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("jwt_secret", &"[REDACTED]")
            .field("session_channel_buffer", &self.session_channel_buffer)
            .field("seed_users_path", &self.seed_users_path)
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

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `HUB_JWT_SECRET` is absent or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `HUB_JWT_SECRET` is absent or a value
    /// does not parse.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let jwt_secret = SecretString::from(
            vars.get("HUB_JWT_SECRET")
                .ok_or_else(|| ConfigError::MissingEnvVar("HUB_JWT_SECRET".to_string()))?
                .clone(),
        );

        let bind_address = vars
            .get("HUB_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let session_channel_buffer = match vars.get("HUB_SESSION_CHANNEL_BUFFER") {
            Some(raw) => raw.parse().map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "HUB_SESSION_CHANNEL_BUFFER must be a positive integer, got {raw:?}"
                ))
            })?,
            None => DEFAULT_SESSION_CHANNEL_BUFFER,
        };

        let seed_users_path = vars.get("HUB_SEED_USERS_PATH").cloned();

        Ok(Config {
            bind_address,
            jwt_secret,
            session_channel_buffer,
            seed_users_path,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::secret::ExposeSecret;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([("HUB_JWT_SECRET".to_string(), "test-secret".to_string())])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.jwt_secret.expose_secret(), "test-secret");
        assert_eq!(
            config.session_channel_buffer,
            DEFAULT_SESSION_CHANNEL_BUFFER
        );
        assert!(config.seed_users_path.is_none());
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let mut vars = base_vars();
        vars.insert("HUB_BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string());
        vars.insert("HUB_SESSION_CHANNEL_BUFFER".to_string(), "128".to_string());
        vars.insert(
            "HUB_SEED_USERS_PATH".to_string(),
            "/etc/hub/seed.json".to_string(),
        );

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.session_channel_buffer, 128);
        assert_eq!(config.seed_users_path.as_deref(), Some("/etc/hub/seed.json"));
    }

    #[test]
    fn test_from_vars_missing_jwt_secret() {
        let result = Config::from_vars(&HashMap::new());
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "HUB_JWT_SECRET"));
    }

    #[test]
    fn test_from_vars_invalid_buffer_size() {
        let mut vars = base_vars();
        vars.insert(
            "HUB_SESSION_CHANNEL_BUFFER".to_string(),
            "not-a-number".to_string(),
        );

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_debug_redacts_jwt_secret() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");
        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("test-secret"));
    }
}
