//! Mock JWKS endpoint
//!
//! Wraps a wiremock server that serves a user pool's key set and records
//! every request, so tests can count how often keys were fetched.

use crate::crypto_fixtures::{jwks_json, TestKeypair};
use crate::test_ids::JWKS_PATH;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock JWKS server.
///
/// # Example
/// ```rust,ignore
/// let keypair = TestKeypair::rsa(TEST_KEY_ID_1);
/// let jwks = MockJwksServer::start(&[&keypair]).await;
/// let store = KeyStore::new(jwks.jwks_url());
/// store.get_keys().await?;
/// assert_eq!(jwks.request_count().await, 1);
/// ```
pub struct MockJwksServer {
    server: MockServer,
}

impl MockJwksServer {
    /// Serve a key set containing `keys`.
    pub async fn start(keys: &[&TestKeypair]) -> Self {
        Self::start_with(ResponseTemplate::new(200).set_body_json(jwks_json(keys))).await
    }

    /// Serve an error status for every request.
    pub async fn start_failing(status: u16) -> Self {
        Self::start_with(ResponseTemplate::new(status)).await
    }

    /// Serve a 200 with an arbitrary raw body.
    pub async fn start_with_body(body: &str) -> Self {
        Self::start_with(
            ResponseTemplate::new(200)
                .set_body_raw(body.to_string(), "application/json"),
        )
        .await
    }

    /// Serve an empty key set, but only after `delay`.
    pub async fn start_slow(delay: Duration) -> Self {
        Self::start_with(
            ResponseTemplate::new(200)
                .set_body_json(jwks_json(&[]))
                .set_delay(delay),
        )
        .await
    }

    async fn start_with(response: ResponseTemplate) -> Self {
        let server = MockServer::start().await;
        mount(&server, response).await;
        Self { server }
    }

    /// Full URL of the JWKS document.
    pub fn jwks_url(&self) -> String {
        format!("{}{}", self.server.uri(), JWKS_PATH)
    }

    /// Number of requests received since start (or the last reset).
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }

    /// Publish a different key set. Also clears the request count.
    pub async fn replace_keys(&self, keys: &[&TestKeypair]) {
        self.replace_response(ResponseTemplate::new(200).set_body_json(jwks_json(keys)))
            .await;
    }

    /// Start failing with `status`. Also clears the request count.
    pub async fn fail_with(&self, status: u16) {
        self.replace_response(ResponseTemplate::new(status)).await;
    }

    async fn replace_response(&self, response: ResponseTemplate) {
        self.server.reset().await;
        mount(&self.server, response).await;
    }
}

async fn mount(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(response)
        .mount(server)
        .await;
}
