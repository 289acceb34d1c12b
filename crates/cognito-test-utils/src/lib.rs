//! # Cognito Test Utilities
//!
//! Shared test utilities for the `cognito-auth` crate.
//!
//! This crate provides:
//! - Signing fixtures (fixed RSA key, deterministic Ed25519 keys)
//! - Claims builders (TestTokenBuilder)
//! - A mock JWKS endpoint that counts fetches (MockJwksServer)
//! - Server test harness (TestAuthServer for E2E tests)
//! - Fixed test IDs
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cognito_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let keypair = TestKeypair::rsa(TEST_KEY_ID_1);
//!     let jwks = MockJwksServer::start(&[&keypair]).await;
//!
//!     let token = keypair.sign(&TestTokenBuilder::new().for_user("alice").build());
//! }
//! ```

pub mod crypto_fixtures;
pub mod jwks_server;
pub mod server_harness;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use jwks_server::*;
pub use server_harness::*;
pub use test_ids::*;
pub use token_builders::*;
