//! Service configuration.
//!
//! Configuration is loaded from environment variables once at startup and
//! passed to the key store and token verifier at construction.

use crate::auth::jwks::{cognito_jwks_url, DEFAULT_FETCH_TIMEOUT_SECONDS};
use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default cookie carrying the access token.
pub const DEFAULT_TOKEN_COOKIE_NAME: &str = "accessToken";

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Upper bound for the JWKS fetch timeout in seconds.
pub const MAX_FETCH_TIMEOUT_SECONDS: u64 = 60;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// AWS region of the user pool (e.g., "us-east-1").
    pub region: String,

    /// Cognito user pool id.
    pub user_pool_id: String,

    /// App client id accepted in the `client_id` claim.
    pub app_client_id: String,

    /// Cookie the adapter reads the access token from.
    pub token_cookie_name: String,

    /// JWKS endpoint, derived from region and pool unless overridden.
    pub jwks_url: String,

    /// Optional lifetime of the cached key set; `None` caches forever.
    pub jwks_cache_ttl_seconds: Option<u64>,

    /// Timeout for the JWKS HTTP request.
    pub jwks_fetch_timeout_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWKS cache TTL configuration: {0}")]
    InvalidCacheTtl(String),

    #[error("Invalid JWKS fetch timeout configuration: {0}")]
    InvalidFetchTimeout(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let region = required(vars, "AWS_COGNITO_REGION")?;
        let user_pool_id = required(vars, "AWS_COGNITO_USER_POOL_ID")?;
        let app_client_id = required(vars, "AWS_COGNITO_APP_CLIENT_ID")?;

        let token_cookie_name = vars
            .get("ACCESS_TOKEN_KEY_NAME")
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_TOKEN_COOKIE_NAME.to_string());

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let jwks_url = vars
            .get("COGNITO_JWKS_URL")
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| cognito_jwks_url(&region, &user_pool_id));

        // Parse optional cache TTL with validation
        let jwks_cache_ttl_seconds = match vars.get("JWKS_CACHE_TTL_SECONDS") {
            Some(value_str) => {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidCacheTtl(format!(
                        "JWKS_CACHE_TTL_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidCacheTtl(
                        "JWKS_CACHE_TTL_SECONDS must be greater than 0".to_string(),
                    ));
                }

                Some(value)
            }
            None => None,
        };

        // Parse fetch timeout with validation
        let jwks_fetch_timeout_seconds = if let Some(value_str) =
            vars.get("JWKS_FETCH_TIMEOUT_SECONDS")
        {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidFetchTimeout(format!(
                    "JWKS_FETCH_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 || value > MAX_FETCH_TIMEOUT_SECONDS {
                return Err(ConfigError::InvalidFetchTimeout(format!(
                    "JWKS_FETCH_TIMEOUT_SECONDS must be between 1 and {}, got {}",
                    MAX_FETCH_TIMEOUT_SECONDS, value
                )));
            }

            value
        } else {
            DEFAULT_FETCH_TIMEOUT_SECONDS
        };

        Ok(Config {
            bind_address,
            region,
            user_pool_id,
            app_client_id,
            token_cookie_name,
            jwks_url,
            jwks_cache_ttl_seconds,
            jwks_fetch_timeout_seconds,
        })
    }
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}
