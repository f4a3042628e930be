// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for kiali-probe.
//!
//! All metrics use the `kiali_probe` namespace prefix. The binary can dump them
//! in text format at exit (`--print-metrics`) so CI jobs can scrape convergence
//! timings from a run.
//!
//! # Metrics Categories
//!
//! - **Wait Metrics** - Poll attempts, wait outcomes and durations
//! - **API Metrics** - Kiali API requests by operation and status
//! - **Fixture Metrics** - Cluster fixtures applied and deleted
//! - **Scenario Metrics** - Scenario and check outcomes
//!
//! # Example
//!
//! ```rust,no_run
//! use kiali_probe::metrics::{gather_metrics, record_api_request};
//!
//! record_api_request("graphNamespaces", 200);
//! println!("{}", gather_metrics().unwrap());
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all probe metrics
const METRICS_NAMESPACE: &str = "kiali_probe";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Wait Metrics
// ============================================================================

/// Total number of poll attempts
///
/// Labels:
/// - `wait`: Deadline message of the wait scope
pub static POLL_ATTEMPTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_poll_attempts_total"),
        "Total number of poll attempts by wait scope",
    );
    let counter = CounterVec::new(opts, &["wait"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of finished waits by outcome
///
/// Labels:
/// - `wait`: Deadline message of the wait scope
/// - `outcome`: `satisfied`, `timeout` or `error`
pub static WAITS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_waits_total"),
        "Total number of finished waits by scope and outcome",
    );
    let counter = CounterVec::new(opts, &["wait", "outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Time spent in wait scopes, in seconds
///
/// Labels:
/// - `outcome`: `satisfied`, `timeout` or `error`
pub static WAIT_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_wait_duration_seconds"),
        "Time spent waiting for convergence by outcome",
    )
    .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0, 180.0, 300.0]);
    let histogram = HistogramVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// API Metrics
// ============================================================================

/// Total number of Kiali API responses by operation and status code
///
/// Labels:
/// - `operation`: Named API operation (e.g., `graphNamespaces`)
/// - `status`: HTTP status code
pub static API_REQUESTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_api_requests_total"),
        "Total number of Kiali API responses by operation and status code",
    );
    let counter = CounterVec::new(opts, &["operation", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of errors by source and category
///
/// Labels:
/// - `source`: Where the error happened (operation, scenario or check name)
/// - `error_type`: Category from `ProbeError::category`
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by source and category",
    );
    let counter = CounterVec::new(opts, &["source", "error_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Fixture Metrics
// ============================================================================

/// Total number of fixture mutations by action and result
///
/// Labels:
/// - `action`: `apply` or `delete`
/// - `result`: `ok` or `failed`
pub static FIXTURE_OPERATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_fixture_operations_total"),
        "Total number of fixture applies and deletes by result",
    );
    let counter = CounterVec::new(opts, &["action", "result"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Scenario Metrics
// ============================================================================

/// Total number of scenario and check runs by kind and outcome
///
/// Labels:
/// - `kind`: `scenario` or `check`
/// - `outcome`: `passed` or `failed`
pub static RUNS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_runs_total"),
        "Total number of scenario and check runs by outcome",
    );
    let counter = CounterVec::new(opts, &["kind", "outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record one poll attempt
pub fn record_poll_attempt(wait: &str) {
    POLL_ATTEMPTS_TOTAL.with_label_values(&[wait]).inc();
}

/// Record the end of a wait scope
///
/// # Arguments
/// * `wait` - Deadline message of the scope
/// * `outcome` - `satisfied`, `timeout` or `error`
/// * `duration` - Time spent in the scope
pub fn record_wait_outcome(wait: &str, outcome: &str, duration: Duration) {
    WAITS_TOTAL.with_label_values(&[wait, outcome]).inc();
    WAIT_DURATION_SECONDS
        .with_label_values(&[outcome])
        .observe(duration.as_secs_f64());
}

/// Record a Kiali API response
pub fn record_api_request(operation: &str, status: u16) {
    let status = status.to_string();
    API_REQUESTS_TOTAL
        .with_label_values(&[operation, status.as_str()])
        .inc();
}

/// Record an error
///
/// # Arguments
/// * `source` - Operation, scenario or check where the error occurred
/// * `error_type` - Category of error (e.g., `timeout`, `unexpected_status`)
pub fn record_error(source: &str, error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[source, error_type]).inc();
}

/// Record a fixture apply or delete
pub fn record_fixture_operation(action: &str, ok: bool) {
    let result = if ok { "ok" } else { "failed" };
    FIXTURE_OPERATIONS_TOTAL
        .with_label_values(&[action, result])
        .inc();
}

/// Record a scenario or check result
pub fn record_run(kind: &str, passed: bool) {
    let outcome = if passed { "passed" } else { "failed" };
    RUNS_TOTAL.with_label_values(&[kind, outcome]).inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_wait_outcome() {
        let wait = "metrics-test-wait";
        record_wait_outcome(wait, "satisfied", Duration::from_millis(500));

        let counter = WAITS_TOTAL.with_label_values(&[wait, "satisfied"]);
        assert!(counter.get() >= 1.0);
    }

    #[test]
    fn test_record_poll_attempt() {
        let wait = "metrics-test-poll";
        record_poll_attempt(wait);
        record_poll_attempt(wait);

        let counter = POLL_ATTEMPTS_TOTAL.with_label_values(&[wait]);
        assert!(counter.get() >= 2.0);
    }

    #[test]
    fn test_record_api_request_uses_status_label() {
        record_api_request("metricsTestOperation", 404);

        let counter = API_REQUESTS_TOTAL.with_label_values(&["metricsTestOperation", "404"]);
        assert!(counter.get() >= 1.0);
    }

    #[test]
    fn test_record_fixture_operation() {
        record_fixture_operation("apply", false);
        let counter = FIXTURE_OPERATIONS_TOTAL.with_label_values(&["apply", "failed"]);
        assert!(counter.get() >= 1.0);
    }

    #[test]
    fn test_gather_metrics() {
        record_run("check", true);
        record_error("metrics-test", "timeout");

        let output = gather_metrics().unwrap();
        assert!(output.contains("kiali_probe_runs_total"));
        assert!(output.contains("kiali_probe_errors_total"));
    }
}
