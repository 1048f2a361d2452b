//! Configuration schema types.
//!
//! Every section rejects unknown fields and fills missing ones with the
//! defaults below.

use std::str::FromStr;

use permalink_telemetry::TelemetryError;
use serde::{Deserialize, Serialize};

/// Server configuration section.
///
/// # Example
///
/// ```
/// use permalink_config::ServerConfig;
///
/// let config = ServerConfig {
///     upstream_url: Some("http://127.0.0.1:8081".to_string()),
///     ..Default::default()
/// };
/// assert_eq!(config.http_addr, "0.0.0.0:8080");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP server bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Renderer that receives every request that is not redirected.
    /// Without one, such requests are answered with 404.
    #[serde(default)]
    pub upstream_url: Option<String>,

    /// Timeout for upstream requests in milliseconds.
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_ms: u64,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            upstream_url: None,
            upstream_timeout_ms: default_upstream_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_upstream_timeout() -> u64 {
    30_000
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// Permalink resolution section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PermalinkConfig {
    /// Whether permalinks are redirected at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Leading path segment of a permalink (`page` for `/page/<id>/`).
    #[serde(default = "default_segment")]
    pub segment: String,

    /// Front controller reported in self URLs (`index.php`).
    #[serde(default)]
    pub script_name: Option<String>,

    /// Treat `X-Forwarded-Proto: https` as a secure request.
    #[serde(default)]
    pub trust_forwarded_proto: bool,

    /// Reuse valid incoming `X-Request-ID` headers.
    #[serde(default)]
    pub trust_request_id: bool,
}

impl Default for PermalinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            segment: default_segment(),
            script_name: None,
            trust_forwarded_proto: false,
            trust_request_id: false,
        }
    }
}

fn default_segment() -> String {
    permalink_core::DEFAULT_SEGMENT.to_string()
}

/// Site data section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// JSON snapshot of pages and cached speaking URLs. When unset the
    /// gateway starts with an empty site.
    #[serde(default)]
    pub snapshot_path: Option<String>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Enable metrics collection and the metrics endpoint.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Histogram bucket boundaries for durations, in seconds.
    #[serde(default = "default_histogram_buckets")]
    pub histogram_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            histogram_buckets: default_histogram_buckets(),
        }
    }
}

fn default_histogram_buckets() -> Vec<f64> {
    vec![
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ]
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    #[serde(alias = "text")]
    Pretty,
}

impl LogFormat {
    /// Returns the lowercase name used in files and environment variables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }
}

/// Accepts the same names as the logging subscriber, including `text`.
impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<permalink_telemetry::LogFormat>().map(Self::from)
    }
}

impl From<permalink_telemetry::LogFormat> for LogFormat {
    fn from(format: permalink_telemetry::LogFormat) -> Self {
        match format {
            permalink_telemetry::LogFormat::Json => Self::Json,
            permalink_telemetry::LogFormat::Pretty => Self::Pretty,
        }
    }
}

impl From<LogFormat> for permalink_telemetry::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log filter (e.g., "info" or "info,permalink_core=debug").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telemetry configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfigSection {
    /// Service name for telemetry identification.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Service version.
    #[serde(default)]
    pub service_version: Option<String>,

    /// Deployment environment (e.g., "development", "production").
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TelemetryConfigSection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            service_version: None,
            environment: default_environment(),
            metrics: MetricsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_service_name() -> String {
    "permalink-gateway".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, "0.0.0.0:8080");
        assert!(config.upstream_url.is_none());
        assert_eq!(config.upstream_timeout_ms, 30_000);
    }

    #[test]
    fn test_permalink_defaults() {
        let config = PermalinkConfig::default();
        assert!(config.enabled);
        assert_eq!(config.segment, "page");
        assert!(config.script_name.is_none());
        assert!(!config.trust_forwarded_proto);
        assert!(!config.trust_request_id);
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let config: PermalinkConfig = toml::from_str(r#"script_name = "index.php""#).unwrap();
        assert_eq!(config.script_name.as_deref(), Some("index.php"));
        assert_eq!(config.segment, "page");
        assert!(config.enabled);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<PermalinkConfig, _> = toml::from_str(r#"segmnet = "p""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format_serde() {
        let config: LoggingConfig = serde_json::from_str(r#"{"format": "pretty"}"#).unwrap();
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(LogFormat::Json.as_str(), "json");
        assert!(serde_json::from_str::<LoggingConfig>(r#"{"format": "xml"}"#).is_err());
    }

    #[test]
    fn test_log_format_names_match_subscriber() {
        for name in ["json", "JSON", "pretty", "text", " Text "] {
            let parsed: LogFormat = name.parse().unwrap();
            let subscriber: permalink_telemetry::LogFormat = name.trim().parse().unwrap();
            assert_eq!(permalink_telemetry::LogFormat::from(parsed), subscriber);
        }
        assert!("xml".parse::<LogFormat>().is_err());

        let config: LoggingConfig = serde_json::from_str(r#"{"format": "text"}"#).unwrap();
        assert_eq!(config.format, LogFormat::Pretty);
    }
}
