//! Token verifier integration tests.
//!
//! Runs every verification gate against a mocked JWKS endpoint.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::Utc;
use cognito_auth::auth::{KeyFetchError, KeyStore, Rejection, TokenVerifier, VerifyError};
use cognito_test_utils::*;
use serde_json::json;
use std::sync::Arc;

fn verifier_for(jwks: &MockJwksServer) -> TokenVerifier {
    let key_store = Arc::new(KeyStore::new(jwks.jwks_url()));
    TokenVerifier::new(key_store, TEST_APP_CLIENT_ID.to_string())
}

fn rejection(result: Result<cognito_auth::auth::Claims, VerifyError>) -> Rejection {
    result
        .expect_err("token should be rejected")
        .rejection()
        .expect("failure should be a rejection, not a key fetch error")
}

// =============================================================================
// Accepted tokens
// =============================================================================

#[tokio::test]
async fn test_valid_token_returns_claims() {
    let keypair = TestKeypair::rsa("k1");
    let jwks = MockJwksServer::start(&[&keypair]).await;
    let verifier = verifier_for(&jwks);

    let exp = Utc::now().timestamp() + 3600;
    let token = keypair.sign(&json!({
        "exp": exp,
        "client_id": "app123",
        "username": "alice",
        "token_use": "access",
    }));

    let claims = verifier.verify(&token).await.unwrap();

    assert_eq!(claims.exp, exp);
    assert_eq!(claims.client_id.as_deref(), Some("app123"));
    assert_eq!(claims.username.as_deref(), Some("alice"));
    assert_eq!(claims.get("token_use"), Some(json!("access")));
}

#[tokio::test]
async fn test_ed25519_key_is_accepted() {
    let keypair = TestKeypair::ed25519(1, TEST_KEY_ID_1);
    let jwks = MockJwksServer::start(&[&keypair]).await;
    let verifier = verifier_for(&jwks);

    let token = keypair.sign(&TestTokenBuilder::new().for_user(TEST_USERNAME_BOB).build());

    let claims = verifier.verify(&token).await.unwrap();
    assert_eq!(claims.subject_name(), Some(TEST_USERNAME_BOB));
}

#[tokio::test]
async fn test_token_matches_second_key_in_set() {
    let first = TestKeypair::ed25519(1, TEST_KEY_ID_1);
    let second = TestKeypair::rsa(TEST_KEY_ID_2);
    let jwks = MockJwksServer::start(&[&first, &second]).await;
    let verifier = verifier_for(&jwks);

    let token = second.sign(&TestTokenBuilder::new().build());

    assert!(verifier.verify(&token).await.is_ok());
}

#[tokio::test]
async fn test_keys_fetched_once_across_verifications() {
    let keypair = TestKeypair::rsa(TEST_KEY_ID_1);
    let jwks = MockJwksServer::start(&[&keypair]).await;
    let verifier = verifier_for(&jwks);

    for _ in 0..5 {
        let token = keypair.sign(&TestTokenBuilder::new().build());
        verifier.verify(&token).await.unwrap();
    }

    assert_eq!(jwks.request_count().await, 1);
}

// =============================================================================
// Rejections
// =============================================================================

#[tokio::test]
async fn test_flipped_signature_bit_is_bad_signature() {
    let keypair = TestKeypair::rsa(TEST_KEY_ID_1);
    let jwks = MockJwksServer::start(&[&keypair]).await;
    let verifier = verifier_for(&jwks);

    let token = tamper_signature(&keypair.sign(&TestTokenBuilder::new().build()));

    assert_eq!(rejection(verifier.verify(&token).await), Rejection::BadSignature);
}

#[tokio::test]
async fn test_token_signed_by_other_key_is_bad_signature() {
    let published = TestKeypair::ed25519(1, TEST_KEY_ID_1);
    let attacker = TestKeypair::ed25519(2, TEST_KEY_ID_1);
    let jwks = MockJwksServer::start(&[&published]).await;
    let verifier = verifier_for(&jwks);

    let token = attacker.sign(&TestTokenBuilder::new().build());

    assert_eq!(rejection(verifier.verify(&token).await), Rejection::BadSignature);
}

#[tokio::test]
async fn test_unknown_kid_is_rejected() {
    let keypair = TestKeypair::rsa("k1");
    let jwks = MockJwksServer::start(&[&keypair]).await;
    let verifier = verifier_for(&jwks);

    // Signed by a published key, but advertising a kid the set does not contain
    let token = keypair.sign_with_kid(&TestTokenBuilder::new().build(), "k2");

    assert_eq!(rejection(verifier.verify(&token).await), Rejection::UnknownKey);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let keypair = TestKeypair::rsa(TEST_KEY_ID_1);
    let jwks = MockJwksServer::start(&[&keypair]).await;
    let verifier = verifier_for(&jwks);

    let token = keypair.sign(&TestTokenBuilder::new().expires_in(-60).build());

    assert_eq!(rejection(verifier.verify(&token).await), Rejection::Expired);
}

#[tokio::test]
async fn test_expired_takes_precedence_over_audience() {
    let keypair = TestKeypair::rsa(TEST_KEY_ID_1);
    let jwks = MockJwksServer::start(&[&keypair]).await;
    let verifier = verifier_for(&jwks);

    let token = keypair.sign(
        &TestTokenBuilder::new()
            .expires_in(-60)
            .for_client(TEST_OTHER_CLIENT_ID)
            .build(),
    );

    assert_eq!(rejection(verifier.verify(&token).await), Rejection::Expired);
}

#[tokio::test]
async fn test_other_client_id_is_audience_mismatch() {
    let keypair = TestKeypair::rsa(TEST_KEY_ID_1);
    let jwks = MockJwksServer::start(&[&keypair]).await;
    let verifier = verifier_for(&jwks);

    let token = keypair.sign(&TestTokenBuilder::new().for_client("other-app").build());

    assert_eq!(
        rejection(verifier.verify(&token).await),
        Rejection::AudienceMismatch
    );
}

#[tokio::test]
async fn test_missing_client_id_is_audience_mismatch() {
    let keypair = TestKeypair::rsa(TEST_KEY_ID_1);
    let jwks = MockJwksServer::start(&[&keypair]).await;
    let verifier = verifier_for(&jwks);

    let token = keypair.sign(&TestTokenBuilder::new().without_client_id().build());

    assert_eq!(
        rejection(verifier.verify(&token).await),
        Rejection::AudienceMismatch
    );
}

#[tokio::test]
async fn test_malformed_token_does_not_fetch_keys() {
    let keypair = TestKeypair::rsa(TEST_KEY_ID_1);
    let jwks = MockJwksServer::start(&[&keypair]).await;
    let verifier = verifier_for(&jwks);

    for token in ["", "not-a-jwt", "a.b", "a.b.c.d", "!!!.payload.signature"] {
        assert_eq!(
            rejection(verifier.verify(token).await),
            Rejection::MalformedToken,
            "token {:?} should be malformed",
            token
        );
    }

    assert_eq!(jwks.request_count().await, 0);
}

#[tokio::test]
async fn test_oversized_token_is_malformed() {
    let keypair = TestKeypair::rsa(TEST_KEY_ID_1);
    let jwks = MockJwksServer::start(&[&keypair]).await;
    let verifier = verifier_for(&jwks);

    let token = keypair.sign(
        &TestTokenBuilder::new()
            .with_claim("padding", json!("x".repeat(10_000)))
            .build(),
    );

    assert_eq!(rejection(verifier.verify(&token).await), Rejection::MalformedToken);
    assert_eq!(jwks.request_count().await, 0);
}

// =============================================================================
// Key fetch failures
// =============================================================================

#[tokio::test]
async fn test_jwks_failure_is_key_fetch_error_and_retried() {
    let keypair = TestKeypair::rsa(TEST_KEY_ID_1);
    let jwks = MockJwksServer::start_failing(500).await;
    let verifier = verifier_for(&jwks);
    let token = keypair.sign(&TestTokenBuilder::new().build());

    let err = verifier.verify(&token).await.unwrap_err();
    assert!(
        matches!(err, VerifyError::KeyFetch(KeyFetchError::Status(500))),
        "expected key fetch error, got {:?}",
        err
    );
    assert_eq!(err.rejection(), None);

    // Nothing was cached, so the next call fetches again and succeeds
    jwks.replace_keys(&[&keypair]).await;
    assert!(verifier.verify(&token).await.is_ok());
    assert_eq!(jwks.request_count().await, 1);
}
