//! Settings handed to [`init_telemetry`](crate::init_telemetry).

use crate::logging::LogConfig;
use crate::metrics::MetricsConfig;

/// Identity of the running service plus the per-subsystem settings.
///
/// The service name is stamped onto both subsystems whenever it or a
/// subsystem config changes, so logs and metrics always agree on it.
///
/// ```
/// use permalink_telemetry::{LogConfig, TelemetryConfig};
///
/// let config = TelemetryConfig::new("edge", "1.4.0")
///     .with_environment("staging")
///     .with_logging(LogConfig::production());
///
/// assert_eq!(config.logging.service_name, "edge");
/// assert_eq!(config.metrics.service_name, "edge");
/// ```
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name reported in logs and metrics.
    pub service_name: String,
    /// Service version.
    pub service_version: String,
    /// Deployment environment.
    pub environment: String,
    /// Prometheus recorder settings.
    pub metrics: MetricsConfig,
    /// Subscriber settings.
    pub logging: LogConfig,
}

impl TelemetryConfig {
    /// Default subsystems for the named service.
    #[must_use]
    pub fn new(service_name: impl Into<String>, service_version: impl Into<String>) -> Self {
        Self {
            service_version: service_version.into(),
            ..Self::default()
        }
        .with_service_name(service_name)
    }

    /// Renames the service in every subsystem.
    #[must_use]
    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self.metrics.service_name.clone_from(&self.service_name);
        self.logging.service_name.clone_from(&self.service_name);
        self
    }

    /// Sets the deployment environment.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Replaces the logging settings.
    #[must_use]
    pub fn with_logging(mut self, logging: LogConfig) -> Self {
        self.logging = LogConfig {
            service_name: self.service_name.clone(),
            ..logging
        };
        self
    }

    /// Replaces the metrics settings.
    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = MetricsConfig {
            service_name: self.service_name.clone(),
            ..metrics
        };
        self
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "permalink-gateway".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
            metrics: MetricsConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogFormat;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "permalink-gateway");
        assert_eq!(config.environment, "development");
        assert_eq!(config.service_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_subsystems_follow_service_name() {
        let config = TelemetryConfig::new("my-site", "2.0.0")
            .with_environment("production")
            .with_logging(LogConfig::development())
            .with_metrics(MetricsConfig::default());

        assert_eq!(config.service_version, "2.0.0");
        assert_eq!(config.environment, "production");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.logging.service_name, "my-site");
        assert_eq!(config.metrics.service_name, "my-site");
    }

    #[test]
    fn test_rename_after_subsystems() {
        let config = TelemetryConfig::default()
            .with_logging(LogConfig::production())
            .with_service_name("renamed");
        assert_eq!(config.logging.service_name, "renamed");
        assert_eq!(config.metrics.service_name, "renamed");
    }
}
