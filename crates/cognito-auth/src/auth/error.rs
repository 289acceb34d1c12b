//! Error types for key fetching and token verification.
//!
//! `KeyFetchError` is an infrastructure failure (the issuer could not be
//! reached or returned garbage) and is kept apart from `Rejection`, which
//! always means the presented credential is bad.

use thiserror::Error;

/// Failure retrieving the user pool's signing-key set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyFetchError {
    /// The HTTP request could not be completed (connect error, timeout).
    #[error("JWKS request failed: {0}")]
    Request(String),

    /// The JWKS endpoint answered with a non-success status.
    #[error("JWKS endpoint returned status {0}")]
    Status(u16),

    /// The response body was not a valid JWKS document.
    #[error("JWKS response could not be parsed: {0}")]
    Parse(String),
}

/// Reason a token was rejected.
///
/// Each verification gate produces its own variant so the adapter can log
/// precisely why a token failed. The `Display` text is for logs only and
/// must not be returned to remote callers.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// Token is structurally invalid (segments, base64, JSON, missing `kid`).
    #[error("malformed token")]
    MalformedToken,

    /// Token `kid` is not present in the cached key set.
    #[error("unknown signing key")]
    UnknownKey,

    /// Signature did not verify against the matched key.
    #[error("bad signature")]
    BadSignature,

    /// Token `exp` is now or in the past.
    #[error("token expired")]
    Expired,

    /// Token `client_id` does not match the configured app client.
    #[error("audience mismatch")]
    AudienceMismatch,
}

impl Rejection {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::MalformedToken => "malformed_token",
            Rejection::UnknownKey => "unknown_key",
            Rejection::BadSignature => "bad_signature",
            Rejection::Expired => "expired",
            Rejection::AudienceMismatch => "audience_mismatch",
        }
    }
}

/// Error returned by `TokenVerifier::verify`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// Signing keys could not be obtained; not the caller's fault.
    #[error("signing keys unavailable: {0}")]
    KeyFetch(#[from] KeyFetchError),

    /// The token itself was rejected.
    #[error("token rejected: {0}")]
    Rejected(#[from] Rejection),
}

impl VerifyError {
    /// Returns the rejection reason, or `None` for key fetch failures.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            VerifyError::Rejected(reason) => Some(*reason),
            VerifyError::KeyFetch(_) => None,
        }
    }
}
