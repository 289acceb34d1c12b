//! Authentication core.
//!
//! # Components
//!
//! - `jwks` - Key store fetching and caching the user pool's signing keys
//! - `jwt` - Token verification against the cached key set
//! - `claims` - Verified claims structure
//! - `error` - Key fetch errors and token rejection reasons

pub mod claims;
pub mod error;
pub mod jwks;
pub mod jwt;

pub use claims::Claims;
pub use error::{KeyFetchError, Rejection, VerifyError};
pub use jwks::{KeySet, KeyStore, SigningKey};
pub use jwt::TokenVerifier;
