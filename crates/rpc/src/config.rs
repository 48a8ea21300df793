//! RPC client configuration.
//!
//! Loaded from environment variables with sensible defaults.

use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default timeout applied to outbound calls, in seconds.
pub const DEFAULT_CALL_TIMEOUT_SECONDS: u64 = 30;

/// RPC client configuration.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Timeout applied to every outbound call. `None` disables the timeout
    /// and leaves an unanswered call pending until the connection dies.
    pub call_timeout: Option<Duration>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            call_timeout: Some(Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECONDS)),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid call timeout configuration: {0}")]
    InvalidCallTimeout(String),
}

impl RpcConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `RPC_CALL_TIMEOUT_SECONDS` is set but not a
    /// non-negative integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// `RPC_CALL_TIMEOUT_SECONDS` set to `0` disables the call timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout value does not parse.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let call_timeout = if let Some(value_str) = vars.get("RPC_CALL_TIMEOUT_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidCallTimeout(format!(
                    "RPC_CALL_TIMEOUT_SECONDS must be a non-negative integer, got '{value_str}': {e}"
                ))
            })?;
            if value == 0 {
                None
            } else {
                Some(Duration::from_secs(value))
            }
        } else {
            Some(Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECONDS))
        };

        Ok(Self { call_timeout })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout() {
        let config = RpcConfig::from_vars(&HashMap::new()).unwrap();
        assert_eq!(
            config.call_timeout,
            Some(Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECONDS))
        );
    }

    #[test]
    fn test_custom_timeout() {
        let vars = HashMap::from([("RPC_CALL_TIMEOUT_SECONDS".to_string(), "5".to_string())]);
        let config = RpcConfig::from_vars(&vars).unwrap();
        assert_eq!(config.call_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_zero_disables_timeout() {
        let vars = HashMap::from([("RPC_CALL_TIMEOUT_SECONDS".to_string(), "0".to_string())]);
        let config = RpcConfig::from_vars(&vars).unwrap();
        assert_eq!(config.call_timeout, None);
    }

    #[test]
    fn test_non_numeric_timeout_rejected() {
        let vars = HashMap::from([(
            "RPC_CALL_TIMEOUT_SECONDS".to_string(),
            "forever".to_string(),
        )]);
        assert!(matches!(
            RpcConfig::from_vars(&vars),
            Err(ConfigError::InvalidCallTimeout(_))
        ));
    }
}
