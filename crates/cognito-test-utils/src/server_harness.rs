//! Test server harness for E2E testing
//!
//! Provides `TestAuthServer` for spawning real service instances in tests.

use crate::test_ids::{TEST_APP_CLIENT_ID, TEST_REGION, TEST_USER_POOL_ID};
use cognito_auth::config::Config;
use cognito_auth::routes::{self, AppState};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning the auth service in E2E tests.
///
/// # Example
/// ```rust,ignore
/// let jwks = MockJwksServer::start(&[&keypair]).await;
/// let server = TestAuthServer::spawn(&jwks.jwks_url()).await?;
///
/// let response = reqwest::Client::new()
///     .get(format!("{}/api/v1/me", server.url()))
///     .bearer_auth(token)
///     .send()
///     .await?;
/// ```
pub struct TestAuthServer {
    addr: SocketAddr,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestAuthServer {
    /// Spawn a server that verifies tokens against `jwks_url`.
    pub async fn spawn(jwks_url: &str) -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(jwks_url, &[]).await
    }

    /// Spawn a server with extra environment-style overrides.
    ///
    /// # Arguments
    /// * `jwks_url` - JWKS endpoint the key store fetches from
    /// * `overrides` - Additional config variables, e.g. `ACCESS_TOKEN_KEY_NAME`
    pub async fn spawn_with_vars(
        jwks_url: &str,
        overrides: &[(&str, &str)],
    ) -> Result<Self, anyhow::Error> {
        let mut vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("AWS_COGNITO_REGION".to_string(), TEST_REGION.to_string()),
            (
                "AWS_COGNITO_USER_POOL_ID".to_string(),
                TEST_USER_POOL_ID.to_string(),
            ),
            (
                "AWS_COGNITO_APP_CLIENT_ID".to_string(),
                TEST_APP_CLIENT_ID.to_string(),
            ),
            ("COGNITO_JWKS_URL".to_string(), jwks_url.to_string()),
        ]);
        for (key, value) in overrides {
            vars.insert((*key).to_string(), (*value).to_string());
        }

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let state = Arc::new(AppState::from_config(config.clone()));

        // Local recorder handle; the global recorder is left to the binary
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();
        let app = routes::build_routes(state, metrics_handle);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        // Spawn server in background
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestAuthServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
