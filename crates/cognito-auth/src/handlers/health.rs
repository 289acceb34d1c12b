//! Health check handler.

/// Liveness probe handler.
///
/// Returns "OK" while the process is running. Does not touch the JWKS
/// endpoint, so an unreachable issuer does not restart the service.
pub async fn health_check() -> &'static str {
    "OK"
}
