//! Observability for the permalink gateway.
//!
//! - **Logging**: structured JSON or pretty logs via `tracing-subscriber`
//! - **Metrics**: Prometheus-format metrics via the `metrics` crate
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `permalink_resolutions_total` | Counter | `outcome` | Resolver decisions |
//! | `permalink_requests_total` | Counter | `status` | Requests answered by the gateway |
//! | `permalink_request_duration_seconds` | Histogram | - | Gateway latency |
//! | `permalink_upstream_requests_total` | Counter | `status` | Requests forwarded upstream |
//! | `permalink_upstream_duration_seconds` | Histogram | - | Upstream latency |
//! | `permalink_in_flight_requests` | Gauge | - | Requests being processed |
//!
//! `outcome` is `redirect` or one of the pass-through reasons (`missing_url`,
//! `no_match`, `page_not_found`, `cache_miss`, `collaborator_failure`,
//! `invalid_location`).
//!
//! # Example
//!
//! ```rust,no_run
//! use permalink_telemetry::{init_telemetry, LogConfig, TelemetryConfig};
//!
//! let config = TelemetryConfig::new("permalink-gateway", "1.0.0")
//!     .with_environment("production")
//!     .with_logging(LogConfig::production());
//!
//! init_telemetry(&config).expect("telemetry");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{
    init_metrics, record_request, record_resolution, record_upstream, render_metrics,
    InFlightGuard, MetricsConfig,
};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// Each subsystem can only be installed once per process; a second call
/// fails with the corresponding [`TelemetryError`].
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = %config.environment,
        metrics = config.metrics.enabled,
        "telemetry initialized"
    );
    Ok(())
}
