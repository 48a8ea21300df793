//! Controller configuration.
//!
//! Configuration is loaded from environment variables. The service token is
//! redacted in Debug output.

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Configuration for the cloud session store client.
#[derive(Clone)]
pub struct CloudConfig {
    /// Base URL of the cloud API, without a trailing slash
    pub base_url: String,

    /// Bearer token for service-to-service calls
    pub service_token: SecretString,
}

/// Custom Debug implementation that redacts the service token.
impl fmt::Debug for CloudConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudConfig")
            .field("base_url", &self.base_url)
            .field("service_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("HTTP client initialization failed: {0}")]
    HttpClient(String),
}

impl CloudConfig {
    /// Create a configuration directly (used by tests and harnesses).
    pub fn new(base_url: impl Into<String>, service_token: SecretString) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            service_token,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `CLOUD_API_BASE_URL` or `CLOUD_SERVICE_TOKEN`
    /// is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let base_url = vars
            .get("CLOUD_API_BASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("CLOUD_API_BASE_URL".to_string()))?
            .clone();

        let service_token = vars
            .get("CLOUD_SERVICE_TOKEN")
            .ok_or_else(|| ConfigError::MissingEnvVar("CLOUD_SERVICE_TOKEN".to_string()))?
            .clone();

        Ok(Self::new(base_url, SecretString::from(service_token)))
    }
}
