//! Current user handler.
//!
//! Returns the identity the auth middleware built from the verified token.

use crate::middleware::AuthenticatedUser;
use axum::{Extension, Json};
use serde::Serialize;
use tracing::instrument;

/// Response for `/api/v1/me` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    /// Username from the token.
    pub username: String,

    /// App client the token was issued for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Token expiration timestamp.
    pub exp: i64,
}

/// Handler for GET /api/v1/me
///
/// ## Response
///
/// ```json
/// {
///   "username": "alice",
///   "client_id": "app123",
///   "exp": 1234567890
/// }
/// ```
#[instrument(skip_all, name = "cognito.handlers.me")]
pub async fn get_me(Extension(user): Extension<AuthenticatedUser>) -> Json<MeResponse> {
    tracing::debug!(target: "cognito.handlers.me", "Returning authenticated user");

    Json(MeResponse {
        username: user.username,
        client_id: user.claims.client_id,
        exp: user.claims.exp,
    })
}
