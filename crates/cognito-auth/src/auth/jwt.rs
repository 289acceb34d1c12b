//! JWT verification against the user pool's signing keys.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only the unverified header is read before the signature check; no
//!   payload field is trusted until the signature verifies
//! - The algorithm comes from the signing key and must fit its key type,
//!   so a token cannot downgrade verification to HMAC
//! - Expiration has no leeway: `exp == now` is already expired

use crate::auth::claims::Claims;
use crate::auth::error::{Rejection, VerifyError};
use crate::auth::jwks::{KeyStore, SigningKey};
use crate::observability::metrics;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use jsonwebtoken::{crypto, Algorithm, DecodingKey};
use std::str::FromStr;
use std::sync::Arc;
use tracing::instrument;

/// Maximum allowed JWT size in bytes (8KB).
///
/// Cognito access tokens are around 1KB; anything far larger is rejected
/// before base64 decoding or signature work.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Fields read from the unverified token header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TokenHeader {
    pub kid: String,
    pub alg: Option<String>,
}

/// Verifies Cognito-issued tokens for one app client.
pub struct TokenVerifier {
    /// Source of the user pool's signing keys.
    key_store: Arc<KeyStore>,

    /// App client id every accepted token must carry in `client_id`.
    expected_client_id: String,
}

impl TokenVerifier {
    /// Create a new token verifier.
    ///
    /// # Arguments
    ///
    /// * `key_store` - Key store for the issuing user pool
    /// * `expected_client_id` - App client id tokens must be issued for
    pub fn new(key_store: Arc<KeyStore>, expected_client_id: String) -> Self {
        Self {
            key_store,
            expected_client_id,
        }
    }

    /// Verify a token and return its claims.
    ///
    /// # Checks, in order
    ///
    /// 1. Size and structure; `kid` read from the unverified header
    /// 2. `kid` looked up in the cached key set
    /// 3. Public key rebuilt from the key's raw parameters
    /// 4. Signature verified over `header.payload`
    /// 5. Payload decoded into claims
    /// 6. `exp` strictly in the future
    /// 7. `client_id` equal to the configured app client id
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::Rejected` with the failing gate's reason, or
    /// `VerifyError::KeyFetch` if the signing keys could not be fetched.
    #[instrument(skip_all)]
    pub async fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        let result = self.verify_inner(token).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(VerifyError::Rejected(reason)) => reason.as_str(),
            Err(VerifyError::KeyFetch(_)) => "key_fetch_error",
        };
        metrics::record_token_verification(outcome);

        result
    }

    async fn verify_inner(&self, token: &str) -> Result<Claims, VerifyError> {
        let header = parse_header(token)?;

        let keys = self.key_store.get_keys().await?;
        let key = keys.find(&header.kid).ok_or_else(|| {
            tracing::debug!(target: "cognito.auth.jwt", kid = %header.kid, "Token kid not found in JWKS");
            Rejection::UnknownKey
        })?;

        verify_signature(token, key, header.alg.as_deref())?;

        // Signature verified, the payload can now be trusted
        let claims = decode_claims(token)?;

        check_expiry(claims.exp, Utc::now().timestamp())?;
        check_client_id(claims.client_id.as_deref(), &self.expected_client_id)?;

        tracing::debug!(target: "cognito.auth.jwt", kid = %header.kid, "Token verified successfully");
        Ok(claims)
    }
}

/// Read the `kid` and `alg` from a token header without verifying anything.
pub(crate) fn parse_header(token: &str) -> Result<TokenHeader, Rejection> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "cognito.auth.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(Rejection::MalformedToken);
    }

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "cognito.auth.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(Rejection::MalformedToken);
    }

    let header_part = parts.first().ok_or(Rejection::MalformedToken)?;
    let header = decode_json_segment(header_part, "header")?;

    // Empty kid is rejected along with missing and non-string kid
    let kid = header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| {
            tracing::debug!(target: "cognito.auth.jwt", "Token rejected: header has no kid");
            Rejection::MalformedToken
        })?;

    let alg = header
        .get("alg")
        .and_then(|v| v.as_str())
        .map(ToString::to_string);

    Ok(TokenHeader { kid, alg })
}

/// Verify the token signature with the matched signing key.
///
/// `header_alg` is only used when the key does not declare an algorithm.
pub(crate) fn verify_signature(
    token: &str,
    key: &SigningKey,
    header_alg: Option<&str>,
) -> Result<(), Rejection> {
    let algorithm = select_algorithm(key, header_alg).ok_or_else(|| {
        tracing::warn!(
            target: "cognito.auth.jwt",
            kid = %key.kid,
            kty = %key.kty,
            key_alg = ?key.alg,
            header_alg = ?header_alg,
            "No usable algorithm for signing key"
        );
        Rejection::BadSignature
    })?;

    let decoding_key = decoding_key(key).ok_or(Rejection::BadSignature)?;

    let (message, signature) = token.rsplit_once('.').ok_or(Rejection::MalformedToken)?;

    match crypto::verify(signature, message.as_bytes(), &decoding_key, algorithm) {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::debug!(target: "cognito.auth.jwt", kid = %key.kid, "Token signature verification failed");
            Err(Rejection::BadSignature)
        }
        Err(e) => {
            tracing::debug!(target: "cognito.auth.jwt", kid = %key.kid, error = %e, "Token signature could not be checked");
            Err(Rejection::BadSignature)
        }
    }
}

/// Pick the verification algorithm for a key.
///
/// The key's own `alg` wins over the token header. The result must belong to
/// the key type's family; HMAC is never selected.
fn select_algorithm(key: &SigningKey, header_alg: Option<&str>) -> Option<Algorithm> {
    let name = key.alg.as_deref().or(header_alg)?;
    let algorithm = Algorithm::from_str(name).ok()?;

    let fits_key_type = match key.kty.as_str() {
        "RSA" => matches!(
            algorithm,
            Algorithm::RS256
                | Algorithm::RS384
                | Algorithm::RS512
                | Algorithm::PS256
                | Algorithm::PS384
                | Algorithm::PS512
        ),
        "EC" => matches!(algorithm, Algorithm::ES256 | Algorithm::ES384),
        "OKP" => matches!(algorithm, Algorithm::EdDSA),
        _ => false,
    };

    fits_key_type.then_some(algorithm)
}

/// Rebuild the public key from the JWK's raw parameters.
fn decoding_key(key: &SigningKey) -> Option<DecodingKey> {
    let built = match (key.kty.as_str(), &key.n, &key.e, &key.x, &key.y) {
        ("RSA", Some(n), Some(e), _, _) => DecodingKey::from_rsa_components(n, e),
        ("EC", _, _, Some(x), Some(y)) => DecodingKey::from_ec_components(x, y),
        ("OKP", _, _, Some(x), _) => DecodingKey::from_ed_components(x),
        _ => {
            tracing::warn!(target: "cognito.auth.jwt", kid = %key.kid, kty = %key.kty, "Signing key is missing public key parameters");
            return None;
        }
    };

    built
        .map_err(|e| {
            tracing::warn!(target: "cognito.auth.jwt", kid = %key.kid, error = %e, "Invalid public key encoding");
        })
        .ok()
}

/// Decode the payload segment into claims.
///
/// Must only be called after `verify_signature` succeeded.
fn decode_claims(token: &str) -> Result<Claims, Rejection> {
    let payload_part = token.split('.').nth(1).ok_or(Rejection::MalformedToken)?;
    let payload = decode_json_segment(payload_part, "payload")?;

    serde_json::from_value(payload).map_err(|e| {
        tracing::debug!(target: "cognito.auth.jwt", error = %e, "Token payload is missing required claims");
        Rejection::MalformedToken
    })
}

fn decode_json_segment(segment: &str, name: &'static str) -> Result<serde_json::Value, Rejection> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        tracing::debug!(target: "cognito.auth.jwt", segment = name, error = %e, "Failed to decode JWT base64");
        Rejection::MalformedToken
    })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(target: "cognito.auth.jwt", segment = name, error = %e, "Failed to parse JWT JSON");
        Rejection::MalformedToken
    })
}

/// Reject tokens whose `exp` is at or before `now` (Unix seconds).
pub(crate) fn check_expiry(exp: i64, now: i64) -> Result<(), Rejection> {
    if now >= exp {
        tracing::debug!(target: "cognito.auth.jwt", exp, now, "Token is expired");
        return Err(Rejection::Expired);
    }
    Ok(())
}

/// Reject tokens not issued for the configured app client.
pub(crate) fn check_client_id(client_id: Option<&str>, expected: &str) -> Result<(), Rejection> {
    if client_id != Some(expected) {
        tracing::debug!(
            target: "cognito.auth.jwt",
            client_id = ?client_id,
            "Token was not issued for this app client"
        );
        return Err(Rejection::AudienceMismatch);
    }
    Ok(())
}
