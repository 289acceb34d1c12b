//! Metrics definitions for token verification.
//!
//! All metrics follow Prometheus naming conventions:
//! - `cognito_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded by code:
//! - `status`: 2 values (success, error)
//! - `outcome`: 7 values (success, key_fetch_error, one per rejection reason)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the global Prometheus recorder.
///
/// JWKS fetch buckets cover the 10 second fetch timeout.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("cognito_jwks_fetch".to_string()),
            &[0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000],
        )
        .map_err(|e| format!("Failed to set JWKS fetch buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

/// Record a JWKS fetch attempt.
///
/// Metric: `cognito_jwks_fetches_total`, `cognito_jwks_fetch_duration_seconds`
/// Labels: `status`
pub fn record_jwks_fetch(status: &str, duration: Duration) {
    histogram!("cognito_jwks_fetch_duration_seconds",
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("cognito_jwks_fetches_total",
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record the outcome of one token verification.
///
/// Metric: `cognito_token_verifications_total`
/// Labels: `outcome`
pub fn record_token_verification(outcome: &str) {
    counter!("cognito_token_verifications_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    #[test]
    fn test_record_functions_without_recorder() {
        // No recorder installed: calls go to the no-op recorder
        record_jwks_fetch("success", Duration::from_millis(20));
        record_jwks_fetch("error", Duration::from_secs(10));
        record_token_verification("success");
        record_token_verification("expired");
    }

    #[test]
    fn test_metric_names_and_counts() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_jwks_fetch("success", Duration::from_millis(20));
            record_token_verification("bad_signature");
            record_token_verification("bad_signature");
        });

        let snapshot = snapshotter.snapshot().into_vec();

        let counter_value = |name: &str| {
            snapshot.iter().find_map(|(key, _, _, value)| {
                if key.key().name() != name {
                    return None;
                }
                match value {
                    DebugValue::Counter(count) => Some(*count),
                    _ => None,
                }
            })
        };

        assert_eq!(counter_value("cognito_jwks_fetches_total"), Some(1));
        assert_eq!(counter_value("cognito_token_verifications_total"), Some(2));
        assert!(snapshot
            .iter()
            .any(|(key, _, _, _)| key.key().name() == "cognito_jwks_fetch_duration_seconds"));
    }
}
