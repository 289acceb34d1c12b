//! Builder patterns for test data construction
//!
//! Provides a fluent API for Cognito access token claims.

use crate::test_ids::{TEST_APP_CLIENT_ID, TEST_USERNAME_ALICE};
use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

/// Builder for Cognito access token claims
///
/// Defaults describe a valid access token for `alice` issued to
/// [`TEST_APP_CLIENT_ID`] and expiring in one hour.
///
/// # Example
/// ```rust,ignore
/// let claims = TestTokenBuilder::new()
///     .for_user("bob")
///     .expires_in(-60)
///     .build();
/// let token = keypair.sign(&claims);
/// ```
pub struct TestTokenBuilder {
    username: String,
    client_id: Option<String>,
    exp: i64,
    iat: i64,
    extra: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            username: TEST_USERNAME_ALICE.to_string(),
            client_id: Some(TEST_APP_CLIENT_ID.to_string()),
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
            extra: Map::new(),
        }
    }

    /// Set the username claim
    pub fn for_user(mut self, username: &str) -> Self {
        self.username = username.to_string();
        self
    }

    /// Set the app client the token is issued to
    pub fn for_client(mut self, client_id: &str) -> Self {
        self.client_id = Some(client_id.to_string());
        self
    }

    /// Omit the `client_id` claim
    pub fn without_client_id(mut self) -> Self {
        self.client_id = None;
        self
    }

    /// Set expiration in seconds from now (negative for the past)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set an absolute expiration timestamp
    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.exp = timestamp;
        self
    }

    /// Add or override an arbitrary claim
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.extra.insert(name.to_string(), value);
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> Value {
        let mut claims = json!({
            "sub": format!("{}-sub", self.username),
            "username": self.username,
            "token_use": "access",
            "scope": "aws.cognito.signin.user.admin",
            "exp": self.exp,
            "iat": self.iat,
        });

        if let Some(object) = claims.as_object_mut() {
            if let Some(client_id) = self.client_id {
                object.insert("client_id".to_string(), Value::String(client_id));
            }
            object.extend(self.extra);
        }

        claims
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
