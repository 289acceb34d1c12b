//! Cognito Auth Library
//!
//! Verifies bearer JWTs issued by an AWS Cognito user pool and exposes the
//! verified claims to the request-handling layer.
//!
//! - Signing keys are fetched from the pool's JWKS endpoint once and cached
//! - Tokens are checked for signature, expiration and app client id
//! - Every rejection carries a specific reason for logging, while the HTTP
//!   adapter collapses them into a single "not authenticated" response
//!
//! # Architecture
//!
//! ```text
//! middleware/auth.rs -> auth/jwt.rs (TokenVerifier) -> auth/jwks.rs (KeyStore) -> Cognito
//! ```
//!
//! # Modules
//!
//! - `auth` - Key store, token verifier and claims
//! - `config` - Service configuration from environment
//! - `errors` - HTTP-facing error type
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authentication middleware
//! - `observability` - Metrics definitions
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
