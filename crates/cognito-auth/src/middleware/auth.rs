//! Authentication middleware for protected routes.
//!
//! Extracts the access token from the configured cookie (falling back to an
//! `Authorization: Bearer` header), verifies it, and injects the
//! authenticated user into request extensions.

use crate::auth::{Claims, TokenVerifier, VerifyError};
use crate::errors::AuthError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// Token verifier with its key store.
    pub verifier: Arc<TokenVerifier>,

    /// Cookie carrying the access token.
    pub token_cookie_name: String,
}

/// Identity built from a verified token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Name read from the token's username claim.
    pub username: String,

    /// All verified claims.
    pub claims: Claims,
}

/// Authentication middleware that verifies Cognito tokens.
///
/// # Token Sources
///
/// ```text
/// Cookie: <token_cookie_name>=<token>
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// - 401 Unauthorized with WWW-Authenticate header for any token problem
/// - 503 Service Unavailable if signing keys cannot be fetched
/// - Otherwise continues with `AuthenticatedUser` in extensions
#[instrument(skip(state, req, next), name = "cognito.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, AuthError> {
    let token = extract_token(req.headers(), &state.token_cookie_name).ok_or_else(|| {
        tracing::debug!(target: "cognito.middleware.auth", "No access token in request");
        AuthError::InvalidToken("Missing access token".to_string())
    })?;

    let claims = state.verifier.verify(&token).await.map_err(|e| {
        if let VerifyError::Rejected(reason) = &e {
            tracing::warn!(target: "cognito.middleware.auth", reason = reason.as_str(), "Token rejected");
        }
        AuthError::from(e)
    })?;

    let username = claims
        .subject_name()
        .map(ToString::to_string)
        .ok_or_else(|| {
            tracing::warn!(target: "cognito.middleware.auth", "Verified token has no username claim");
            AuthError::InvalidToken("Missing username claim".to_string())
        })?;

    tracing::debug!(target: "cognito.middleware.auth", "Authentication successful");

    req.extensions_mut()
        .insert(AuthenticatedUser { username, claims });

    Ok(next.run(req).await)
}

/// Find the raw token in the request headers.
///
/// The cookie wins over the Authorization header when both are present.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    cookie_value(headers, cookie_name).or_else(|| bearer_token(headers))
}

fn cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
}
