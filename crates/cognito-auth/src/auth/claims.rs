//! JWT claims structure.
//!
//! Contains the claims decoded from a verified token. The fields the verifier
//! checks are typed; everything else in the payload is kept verbatim in
//! `extra`. The `username` and `sub` fields are redacted in Debug output.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Cognito username claim used by ID tokens.
const COGNITO_USERNAME_CLAIM: &str = "cognito:username";

/// Claims of a verified token.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// App client the token was issued for (access tokens).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// User name (access tokens) - redacted in Debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Subject (user pool user id) - redacted in Debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Remaining payload fields, unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("exp", &self.exp)
            .field("client_id", &self.client_id)
            .field("username", &self.username.as_ref().map(|_| "[REDACTED]"))
            .field("sub", &self.sub.as_ref().map(|_| "[REDACTED]"))
            .field("extra_keys", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Claims {
    /// Name identifying the authenticated user.
    ///
    /// Access tokens carry `username`, ID tokens carry `cognito:username`;
    /// `sub` is the last resort.
    pub fn subject_name(&self) -> Option<&str> {
        self.username
            .as_deref()
            .or_else(|| {
                self.extra
                    .get(COGNITO_USERNAME_CLAIM)
                    .and_then(Value::as_str)
            })
            .or(self.sub.as_deref())
    }

    /// Look up any payload field by name.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "exp" => Some(Value::from(self.exp)),
            "client_id" => self.client_id.clone().map(Value::String),
            "username" => self.username.clone().map(Value::String),
            "sub" => self.sub.clone().map(Value::String),
            other => self.extra.get(other).cloned(),
        }
    }
}
