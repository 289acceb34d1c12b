//! Key store for fetching and caching the user pool's signing keys.
//!
//! The key store fetches the JSON Web Key Set from the Cognito user pool's
//! `/.well-known/jwks.json` endpoint the first time keys are needed and
//! reuses that set for every later verification.
//!
//! # Caching
//!
//! - The first fetch is serialized: concurrent first callers trigger exactly
//!   one request and all observe the same `Arc<KeySet>`
//! - A failed fetch leaves the cache empty, so the next call retries
//! - Without a TTL the set is held for the process lifetime; `invalidate()`
//!   or a configured TTL picks up issuer key rotation

use crate::auth::error::KeyFetchError;
use crate::config::Config;
use crate::observability::metrics;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

/// Default timeout for the JWKS HTTP request in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// Build the public JWKS URL of a Cognito user pool.
pub fn cognito_jwks_url(region: &str, user_pool_id: &str) -> String {
    format!(
        "https://cognito-idp.{}.amazonaws.com/{}/.well-known/jwks.json",
        region, user_pool_id
    )
}

/// Public signing key published by the user pool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SigningKey {
    /// Key type ("RSA" for Cognito, "EC" or "OKP" for other issuers).
    pub kty: String,

    /// Key ID - matched against the token header's `kid`.
    pub kid: String,

    /// Algorithm the key signs with (e.g. "RS256").
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig").
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url).
    #[serde(default)]
    pub e: Option<String>,

    /// Curve name for EC and OKP keys.
    #[serde(default)]
    pub crv: Option<String>,

    /// EC x coordinate or OKP public key (base64url).
    #[serde(default)]
    pub x: Option<String>,

    /// EC y coordinate (base64url).
    #[serde(default)]
    pub y: Option<String>,
}

/// Ordered signing keys of one user pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySet {
    issuer_url: String,
    keys: Vec<SigningKey>,
}

impl KeySet {
    /// Create a key set fetched from `issuer_url`.
    pub fn new(issuer_url: String, keys: Vec<SigningKey>) -> Self {
        Self { issuer_url, keys }
    }

    /// Find a key by ID.
    ///
    /// Linear scan in published order; the first key with an equal `kid`
    /// wins even if the issuer publishes duplicates.
    pub fn find(&self, kid: &str) -> Option<&SigningKey> {
        self.keys.iter().find(|key| key.kid == kid)
    }

    /// URL the set was fetched from.
    pub fn issuer_url(&self) -> &str {
        &self.issuer_url
    }

    pub fn keys(&self) -> &[SigningKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// JWKS document returned by the user pool.
#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<SigningKey>,
}

/// Cached key set with the time it was fetched.
struct CachedKeySet {
    keys: Arc<KeySet>,
    fetched_at: Instant,
}

/// Fetch-once cache of a user pool's signing keys.
pub struct KeyStore {
    /// URL of the JWKS endpoint.
    jwks_url: String,

    /// HTTP client for fetching JWKS.
    http_client: reqwest::Client,

    /// Cached key set, `None` until the first successful fetch.
    cache: RwLock<Option<CachedKeySet>>,

    /// Serializes the fetch-if-empty section.
    populate_lock: Mutex<()>,

    /// Optional lifetime of a cached set; `None` keeps it forever.
    cache_ttl: Option<Duration>,
}

impl KeyStore {
    /// Create a key store that caches keys for the process lifetime.
    ///
    /// # Arguments
    ///
    /// * `jwks_url` - URL of the user pool's JWKS endpoint
    pub fn new(jwks_url: String) -> Self {
        Self::with_settings(
            jwks_url,
            None,
            Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECONDS),
        )
    }

    /// Create a key store with explicit cache and timeout settings.
    ///
    /// # Arguments
    ///
    /// * `jwks_url` - URL of the user pool's JWKS endpoint
    /// * `cache_ttl` - How long a fetched set stays valid, `None` for forever
    /// * `fetch_timeout` - Timeout for the JWKS HTTP request
    pub fn with_settings(
        jwks_url: String,
        cache_ttl: Option<Duration>,
        fetch_timeout: Duration,
    ) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "cognito.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            cache: RwLock::new(None),
            populate_lock: Mutex::new(()),
            cache_ttl,
        }
    }

    /// Create a key store from service configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::with_settings(
            config.jwks_url.clone(),
            config.jwks_cache_ttl_seconds.map(Duration::from_secs),
            Duration::from_secs(config.jwks_fetch_timeout_seconds),
        )
    }

    /// URL of the JWKS endpoint this store fetches from.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Get the current key set, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Returns `KeyFetchError` if the set is not cached and cannot be fetched.
    /// Nothing is cached on failure.
    #[instrument(skip(self))]
    pub async fn get_keys(&self) -> Result<Arc<KeySet>, KeyFetchError> {
        if let Some(keys) = self.cached().await {
            tracing::trace!(target: "cognito.auth.jwks", "JWKS cache hit");
            return Ok(keys);
        }

        let _populate = self.populate_lock.lock().await;

        // Another caller may have populated the cache while we waited
        if let Some(keys) = self.cached().await {
            return Ok(keys);
        }

        let keys = Arc::new(self.fetch().await?);

        let mut cache = self.cache.write().await;
        *cache = Some(CachedKeySet {
            keys: Arc::clone(&keys),
            fetched_at: Instant::now(),
        });

        Ok(keys)
    }

    /// Drop the cached key set so the next lookup fetches again.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        if cache.take().is_some() {
            tracing::info!(target: "cognito.auth.jwks", "JWKS cache invalidated");
        }
    }

    async fn cached(&self) -> Option<Arc<KeySet>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|cached| self.is_fresh(cached))
            .map(|cached| Arc::clone(&cached.keys))
    }

    fn is_fresh(&self, cached: &CachedKeySet) -> bool {
        self.cache_ttl
            .map_or(true, |ttl| cached.fetched_at.elapsed() < ttl)
    }

    /// Fetch and parse the JWKS document.
    async fn fetch(&self) -> Result<KeySet, KeyFetchError> {
        tracing::debug!(target: "cognito.auth.jwks", url = %self.jwks_url, "Fetching JWKS");
        let start = Instant::now();

        let result = self.fetch_inner().await;

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::record_jwks_fetch(status, start.elapsed());

        result
    }

    async fn fetch_inner(&self) -> Result<KeySet, KeyFetchError> {
        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "cognito.auth.jwks", error = %e, "Failed to fetch JWKS");
                KeyFetchError::Request(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(
                target: "cognito.auth.jwks",
                status = %status,
                "JWKS endpoint returned error"
            );
            return Err(KeyFetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::error!(target: "cognito.auth.jwks", error = %e, "Failed to read JWKS response");
            KeyFetchError::Request(e.to_string())
        })?;

        let jwks: JwksResponse = serde_json::from_slice(&body).map_err(|e| {
            tracing::error!(target: "cognito.auth.jwks", error = %e, "Failed to parse JWKS response");
            KeyFetchError::Parse(e.to_string())
        })?;

        tracing::info!(
            target: "cognito.auth.jwks",
            key_count = jwks.keys.len(),
            "JWKS cache populated"
        );

        Ok(KeySet::new(self.jwks_url.clone(), jwks.keys))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cognito_jwks_url() {
        assert_eq!(
            cognito_jwks_url("eu-west-1", "eu-west-1_AbCdEf123"),
            "https://cognito-idp.eu-west-1.amazonaws.com/eu-west-1_AbCdEf123/.well-known/jwks.json"
        );
    }

    #[test]
    fn test_signing_key_deserialization_rsa() {
        let json = r#"{
            "alg": "RS256",
            "e": "AQAB",
            "kid": "abcdefghijklmnopqrsexample=",
            "kty": "RSA",
            "n": "lsjhglskjhgslkjgh43lj5h34lkjh34lkjht3example",
            "use": "sig"
        }"#;

        let key: SigningKey = serde_json::from_str(json).unwrap();

        assert_eq!(key.kty, "RSA");
        assert_eq!(key.kid, "abcdefghijklmnopqrsexample=");
        assert_eq!(key.alg.as_deref(), Some("RS256"));
        assert_eq!(key.key_use.as_deref(), Some("sig"));
        assert_eq!(key.e.as_deref(), Some("AQAB"));
        assert!(key.n.is_some());
        assert!(key.x.is_none());
    }

    #[test]
    fn test_signing_key_deserialization_minimal() {
        let key: SigningKey = serde_json::from_str(r#"{"kty":"OKP","kid":"k2"}"#).unwrap();

        assert_eq!(key.kid, "k2");
        assert!(key.alg.is_none());
        assert!(key.crv.is_none());
        assert!(key.x.is_none());
    }

    #[test]
    fn test_signing_key_requires_kid() {
        let result: Result<SigningKey, _> = serde_json::from_str(r#"{"kty":"RSA"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_jwks_response_preserves_order() {
        let json = r#"{
            "keys": [
                {"kty": "RSA", "kid": "key-1"},
                {"kty": "RSA", "kid": "key-2"}
            ]
        }"#;

        let jwks: JwksResponse = serde_json::from_str(json).unwrap();
        let set = KeySet::new("https://issuer".to_string(), jwks.keys);

        assert_eq!(set.len(), 2);
        assert_eq!(set.keys().first().unwrap().kid, "key-1");
        assert_eq!(set.keys().get(1).unwrap().kid, "key-2");
    }

    #[test]
    fn test_key_set_find_first_match_wins() {
        let first: SigningKey =
            serde_json::from_str(r#"{"kty":"RSA","kid":"dup","alg":"RS256"}"#).unwrap();
        let second: SigningKey =
            serde_json::from_str(r#"{"kty":"RSA","kid":"dup","alg":"RS512"}"#).unwrap();
        let set = KeySet::new("https://issuer".to_string(), vec![first, second]);

        let found = set.find("dup").unwrap();
        assert_eq!(found.alg.as_deref(), Some("RS256"));
    }

    #[test]
    fn test_key_set_find_missing() {
        let set = KeySet::new("https://issuer".to_string(), Vec::new());
        assert!(set.is_empty());
        assert!(set.find("k1").is_none());
    }

    #[test]
    fn test_key_store_creation() {
        let store = KeyStore::new("http://localhost:9000/.well-known/jwks.json".to_string());
        assert_eq!(store.jwks_url(), "http://localhost:9000/.well-known/jwks.json");
        assert!(store.cache_ttl.is_none());
    }

    #[test]
    fn test_key_store_custom_ttl() {
        let store = KeyStore::with_settings(
            "http://localhost:9000/.well-known/jwks.json".to_string(),
            Some(Duration::from_secs(60)),
            Duration::from_secs(2),
        );
        assert_eq!(store.cache_ttl, Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_unreachable_issuer_is_key_fetch_error() {
        // Port 9 (discard) on localhost is not expected to serve HTTP
        let store = KeyStore::with_settings(
            "http://127.0.0.1:9/.well-known/jwks.json".to_string(),
            None,
            Duration::from_secs(2),
        );

        let err = store.get_keys().await.unwrap_err();
        assert!(matches!(err, KeyFetchError::Request(_)), "got {:?}", err);
        assert!(store.cache.read().await.is_none());
    }
}
