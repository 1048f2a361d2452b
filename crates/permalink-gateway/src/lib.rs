//! Permalink gateway: a front server that answers `/page/<id>/` permalinks
//! with a `301` to the page's speaking URL and forwards every other request
//! to the site renderer.
//!
//! ```text
//!  client ──► GatewayServer ──► Pipeline ─┬─ request_id
//!                  │                      └─ permalink ──► 301 Location
//!                  │                                │
//!                  │                                ▼ (pass through)
//!                  │                           ProxyClient ──► upstream
//!                  ▼
//!        /_permalink/health, /_permalink/metrics
//! ```
//!
//! The resolver reads pages and cached speaking URLs from a [`Site`] loaded
//! from a JSON snapshot.

#![doc(html_root_url = "https://docs.rs/permalink-gateway/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod proxy;
pub mod server;
pub mod shutdown;
pub mod site;

pub use error::{GatewayError, GatewayResult};
pub use proxy::ProxyClient;
pub use server::{GatewayServer, HealthResponse, HEALTH_PATH, METRICS_PATH};
pub use shutdown::{ConnectionTracker, ShutdownSignal};
pub use site::{Site, SiteSnapshot, UrlSnapshot};

use permalink_config::GatewayConfig;
use permalink_telemetry::{LogConfig, MetricsConfig, TelemetryConfig};

/// Gateway version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maps the `telemetry` configuration section onto the telemetry crate.
#[must_use]
pub fn telemetry_config(config: &GatewayConfig) -> TelemetryConfig {
    let section = &config.telemetry;
    let logging = &section.logging;

    let log_config = LogConfig {
        enabled: logging.enabled,
        level: logging.level.clone(),
        format: logging.format.into(),
        span_events: false,
        file_line_info: logging.include_location,
        include_target: true,
        ansi: logging.ansi_enabled,
        ..LogConfig::default()
    };

    let metrics_config = MetricsConfig {
        enabled: section.metrics.enabled,
        duration_buckets: section.metrics.histogram_buckets.clone(),
        ..MetricsConfig::default()
    };

    TelemetryConfig::new(
        section.service_name.as_str(),
        section.service_version.as_deref().unwrap_or(VERSION),
    )
    .with_environment(section.environment.as_str())
    .with_logging(log_config)
    .with_metrics(metrics_config)
}
