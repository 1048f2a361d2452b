//! Prometheus metrics.
//!
//! [`init_metrics`] installs a global Prometheus recorder; the gateway
//! serves [`render_metrics`] on its internal metrics endpoint. The
//! `record_*` functions are no-ops until a recorder is installed, so library
//! code and tests can call them unconditionally.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Resolver decisions by outcome.
pub const RESOLUTIONS_TOTAL: &str = "permalink_resolutions_total";
/// Requests answered by the gateway by status.
pub const REQUESTS_TOTAL: &str = "permalink_requests_total";
/// Gateway request latency.
pub const REQUEST_DURATION: &str = "permalink_request_duration_seconds";
/// Requests forwarded upstream by status.
pub const UPSTREAM_REQUESTS_TOTAL: &str = "permalink_upstream_requests_total";
/// Upstream latency.
pub const UPSTREAM_DURATION: &str = "permalink_upstream_duration_seconds";
/// Requests being processed.
pub const IN_FLIGHT_REQUESTS: &str = "permalink_in_flight_requests";

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Service name for metric labels.
    pub service_name: String,

    /// Histogram buckets for request and upstream durations, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: "permalink-gateway".to_string(),
            // 1ms .. 10s
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Installs the global Prometheus recorder.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if the buckets are invalid or a
/// recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .add_global_label("service", config.service_name.clone())
        .set_buckets_for_metric(
            Matcher::Suffix("_duration_seconds".to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);
    register_metric_descriptions();

    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(RESOLUTIONS_TOTAL, "Permalink resolver decisions by outcome");
    describe_counter!(REQUESTS_TOTAL, "HTTP requests answered by the gateway");
    describe_histogram!(REQUEST_DURATION, "Gateway request duration in seconds");
    describe_counter!(UPSTREAM_REQUESTS_TOTAL, "Requests forwarded to the upstream");
    describe_histogram!(UPSTREAM_DURATION, "Upstream request duration in seconds");
    describe_gauge!(IN_FLIGHT_REQUESTS, "HTTP requests currently being processed");
}

/// Records one resolver decision (`redirect` or a pass-through reason).
pub fn record_resolution(outcome: &'static str) {
    counter!(RESOLUTIONS_TOTAL, "outcome" => outcome).increment(1);
}

/// Records a request answered by the gateway.
pub fn record_request(status_code: u16, duration: Duration) {
    counter!(REQUESTS_TOTAL, "status" => status_code.to_string()).increment(1);
    histogram!(REQUEST_DURATION).record(duration.as_secs_f64());
}

/// Records a forwarded request. `status_code` is `None` when the upstream
/// could not be reached.
pub fn record_upstream(status_code: Option<u16>, duration: Duration) {
    let status = status_code.map_or_else(|| "error".to_string(), |code| code.to_string());
    counter!(UPSTREAM_REQUESTS_TOTAL, "status" => status).increment(1);
    histogram!(UPSTREAM_DURATION).record(duration.as_secs_f64());
}

/// Tracks one in-flight request; decrements the gauge on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Creates a new guard and increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!(IN_FLIGHT_REQUESTS).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(IN_FLIGHT_REQUESTS).decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.service_name, "permalink-gateway");
        assert_eq!(config.duration_buckets.len(), 12);
    }

    #[test]
    fn test_disabled_metrics_skip_install() {
        let config = MetricsConfig {
            enabled: false,
            ..MetricsConfig::default()
        };
        assert!(init_metrics(&config).is_ok());
    }

    #[test]
    fn test_record_functions_without_recorder() {
        record_resolution("redirect");
        record_resolution("no_match");
        record_request(301, Duration::from_millis(2));
        record_upstream(Some(200), Duration::from_millis(15));
        record_upstream(None, Duration::from_millis(15));
        drop(InFlightGuard::new());
    }

    #[test]
    fn test_metric_names() {
        for name in [
            RESOLUTIONS_TOTAL,
            REQUESTS_TOTAL,
            UPSTREAM_REQUESTS_TOTAL,
            IN_FLIGHT_REQUESTS,
        ] {
            assert!(name.starts_with("permalink_"));
        }
        assert!(REQUEST_DURATION.ends_with("_duration_seconds"));
        assert!(UPSTREAM_DURATION.ends_with("_duration_seconds"));
    }
}
