//! HTTP-facing error type.
//!
//! Every token rejection collapses into one generic 401 so remote callers
//! learn nothing about why verification failed. Key fetch failures are an
//! infrastructure problem and map to 503. The specific reason is logged
//! server-side.

use crate::auth::VerifyError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Message returned for every authentication failure.
pub const AUTHENTICATION_FAILED: &str = "Authentication failed";

/// Authentication adapter error type.
///
/// Maps to HTTP status codes:
/// - InvalidToken: 401 Unauthorized
/// - ServiceUnavailable: 503 Service Unavailable
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidToken(_) => 401,
            AuthError::ServiceUnavailable(_) => 503,
        }
    }
}

impl From<VerifyError> for AuthError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Rejected(reason) => AuthError::InvalidToken(reason.to_string()),
            VerifyError::KeyFetch(e) => AuthError::ServiceUnavailable(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthError::InvalidToken(reason) => {
                tracing::debug!(target: "cognito.auth", reason = %reason, "Authentication failed");
                (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_TOKEN",
                    AUTHENTICATION_FAILED.to_string(),
                )
            }
            AuthError::ServiceUnavailable(reason) => {
                // Issuer unreachable is a service-health signal, not a bad credential
                tracing::error!(target: "cognito.availability", reason = %reason, "Service unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Service temporarily unavailable".to_string(),
                )
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) = "Bearer realm=\"cognito-auth\", error=\"invalid_token\"".parse()
            {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}
