//! Fixed test identifiers for deterministic tests

// User pool
pub const TEST_REGION: &str = "us-east-1";
pub const TEST_USER_POOL_ID: &str = "us-east-1_TestPool";

// App clients
pub const TEST_APP_CLIENT_ID: &str = "app123";
pub const TEST_OTHER_CLIENT_ID: &str = "other-app";

// Signing key IDs
pub const TEST_KEY_ID_1: &str = "test-key-2025-01";
pub const TEST_KEY_ID_2: &str = "test-key-2025-02";

// Users
pub const TEST_USERNAME_ALICE: &str = "alice";
pub const TEST_USERNAME_BOB: &str = "bob";

/// Path the mocked JWKS endpoint is served on.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";
