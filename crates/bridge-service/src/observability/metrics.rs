//! Metrics definitions for the disclosure bridge.
//!
//! All metrics follow Prometheus naming conventions:
//! - `bridge_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded by code. Room names and attribute values never
//! appear as labels:
//! - `status` / `outcome`: bounded by [`crate::errors::BridgeError::metric_label`]
//! - `operation`: `start_session` or `fetch_result`

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // IRMA calls are bounded by the client timeout (10s default)
        .set_buckets_for_metric(
            Matcher::Prefix("bridge_irma_request".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.000, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set IRMA request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// Bridge Operations
// ============================================================================

/// Record a `GET /session` outcome.
///
/// Metric: `bridge_sessions_started_total`
/// Labels: `status`
pub fn record_session_started(status: &'static str) {
    counter!("bridge_sessions_started_total", "status" => status).increment(1);
}

/// Record a `POST /disclose` outcome.
///
/// Metric: `bridge_disclosures_total`
/// Labels: `outcome`
pub fn record_disclosure(outcome: &'static str) {
    counter!("bridge_disclosures_total", "outcome" => outcome).increment(1);
}

// ============================================================================
// IRMA Server Calls
// ============================================================================

/// Record a single HTTP attempt against the IRMA server.
///
/// Metric: `bridge_irma_request_duration_seconds`
/// Labels: `operation`, `status` (success, rejected, error)
pub fn record_irma_request(operation: &'static str, status: &'static str, duration: Duration) {
    histogram!("bridge_irma_request_duration_seconds",
        "operation" => operation,
        "status" => status
    )
    .record(duration.as_secs_f64());
}

/// Record a retry of a failed IRMA call.
///
/// Metric: `bridge_irma_retries_total`
/// Labels: `operation`
pub fn record_irma_retry(operation: &'static str) {
    counter!("bridge_irma_retries_total", "operation" => operation).increment(1);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    fn counter_value(
        snapshot: &[(
            metrics_util::CompositeKey,
            Option<metrics::Unit>,
            Option<metrics::SharedString>,
            DebugValue,
        )],
        name: &str,
        label: (&str, &str),
    ) -> Option<u64> {
        snapshot.iter().find_map(|(key, _, _, value)| {
            let key = key.key();
            let matches = key.name() == name
                && key
                    .labels()
                    .any(|l| l.key() == label.0 && l.value() == label.1);
            match (matches, value) {
                (true, DebugValue::Counter(v)) => Some(*v),
                _ => None,
            }
        })
    }

    #[test]
    fn test_bridge_counters_are_labelled() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_session_started("success");
            record_session_started("success");
            record_session_started("unknown_room");
            record_disclosure("session_pending");
            record_irma_retry("fetch_result");
        });

        let snapshot = snapshotter.snapshot().into_vec();

        assert_eq!(
            counter_value(&snapshot, "bridge_sessions_started_total", ("status", "success")),
            Some(2)
        );
        assert_eq!(
            counter_value(&snapshot, "bridge_sessions_started_total", ("status", "unknown_room")),
            Some(1)
        );
        assert_eq!(
            counter_value(&snapshot, "bridge_disclosures_total", ("outcome", "session_pending")),
            Some(1)
        );
        assert_eq!(
            counter_value(&snapshot, "bridge_irma_retries_total", ("operation", "fetch_result")),
            Some(1)
        );
    }

    #[test]
    fn test_irma_request_histogram_records_duration() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_irma_request("start_session", "success", Duration::from_millis(40));
        });

        let snapshot = snapshotter.snapshot().into_vec();
        let recorded = snapshot.iter().any(|(key, _, _, value)| {
            key.key().name() == "bridge_irma_request_duration_seconds"
                && matches!(value, DebugValue::Histogram(samples) if samples.len() == 1)
        });
        assert!(recorded);
    }
}
