//! Main gateway configuration type.

use crate::error::ConfigError;
use crate::schema::{PermalinkConfig, ServerConfig, SiteConfig, TelemetryConfigSection};
use permalink_core::{PermalinkError, PermalinkMatcher};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Complete gateway configuration.
///
/// # Example
///
/// ```
/// use permalink_config::GatewayConfig;
///
/// let config = GatewayConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert_eq!(config.permalink.segment, "page");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Listener and upstream settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Permalink grammar and request-context settings.
    #[serde(default)]
    pub permalink: PermalinkConfig,

    /// Site data source.
    #[serde(default)]
    pub site: SiteConfig,

    /// Logging and metrics.
    #[serde(default)]
    pub telemetry: TelemetryConfigSection,
}

impl GatewayConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }

    /// Development preset: pretty colored logs at debug level and trusted
    /// forwarding headers.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.telemetry.environment = "development".to_string();
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = crate::schema::LogFormat::Pretty;
        config.telemetry.logging.ansi_enabled = true;
        config.telemetry.logging.include_location = true;
        config.permalink.trust_forwarded_proto = true;
        config.permalink.trust_request_id = true;
        config
    }

    /// Production preset: JSON logs at info level, forwarding headers are
    /// not trusted.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.telemetry.environment = "production".to_string();
        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = crate::schema::LogFormat::Json;
        config.telemetry.logging.ansi_enabled = false;
        config
    }

    /// Parses the bind address.
    pub fn http_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.http_addr.parse().map_err(|e| {
            ConfigError::invalid_value(
                "server.http_addr",
                format!("{}: {e}", self.server.http_addr),
            )
        })
    }

    /// Validates cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.http_addr()?;

        if let Some(upstream) = &self.server.upstream_url {
            if !(upstream.starts_with("http://") || upstream.starts_with("https://")) {
                return Err(ConfigError::invalid_value(
                    "server.upstream_url",
                    format!("{upstream} must start with http:// or https://"),
                ));
            }
        }

        if self.server.upstream_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.upstream_timeout_ms",
                "must be greater than zero",
            ));
        }

        if let Err(err) = PermalinkMatcher::with_segment(&self.permalink.segment) {
            let reason = match err {
                PermalinkError::InvalidSegment { reason, .. } => reason,
                other => other.to_string(),
            };
            return Err(ConfigError::invalid_value("permalink.segment", reason));
        }

        if let Some(script) = &self.permalink.script_name {
            if script.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    "permalink.script_name",
                    "must not be blank when set",
                ));
            }
        }

        if self.telemetry.service_name.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "telemetry.service_name",
                "must not be empty",
            ));
        }

        if self.telemetry.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "telemetry.logging.level",
                "must not be empty",
            ));
        }

        let buckets = &self.telemetry.metrics.histogram_buckets;
        if buckets.is_empty() {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.histogram_buckets",
                "must not be empty",
            ));
        }
        if buckets.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.histogram_buckets",
                "must be strictly increasing",
            ));
        }

        Ok(())
    }
}

/// Builder for [`GatewayConfig`].
#[derive(Debug, Default)]
pub struct GatewayConfigBuilder {
    server: Option<ServerConfig>,
    permalink: Option<PermalinkConfig>,
    site: Option<SiteConfig>,
    telemetry: Option<TelemetryConfigSection>,
}

impl GatewayConfigBuilder {
    /// Sets the server section.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Sets the permalink section.
    #[must_use]
    pub fn permalink(mut self, permalink: PermalinkConfig) -> Self {
        self.permalink = Some(permalink);
        self
    }

    /// Sets the site section.
    #[must_use]
    pub fn site(mut self, site: SiteConfig) -> Self {
        self.site = Some(site);
        self
    }

    /// Sets the telemetry section.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetryConfigSection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Builds the configuration without validation.
    #[must_use]
    pub fn build(self) -> GatewayConfig {
        GatewayConfig {
            server: self.server.unwrap_or_default(),
            permalink: self.permalink.unwrap_or_default(),
            site: self.site.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
        }
    }

    /// Builds and validates the configuration.
    pub fn build_validated(self) -> Result<GatewayConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::LogFormat;

    #[test]
    fn test_default_is_valid() {
        assert!(GatewayConfig::default().validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let dev = GatewayConfig::development();
        assert_eq!(dev.telemetry.logging.format, LogFormat::Pretty);
        assert_eq!(dev.telemetry.logging.level, "debug");
        assert!(dev.permalink.trust_forwarded_proto);
        assert!(dev.validate().is_ok());

        let prod = GatewayConfig::production();
        assert_eq!(prod.telemetry.environment, "production");
        assert_eq!(prod.telemetry.logging.format, LogFormat::Json);
        assert!(!prod.permalink.trust_forwarded_proto);
        assert!(prod.validate().is_ok());
    }

    #[test]
    fn test_invalid_http_addr() {
        let config = GatewayConfig::builder()
            .server(ServerConfig {
                http_addr: "not-an-addr".to_string(),
                ..Default::default()
            })
            .build();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.http_addr"));
    }

    #[test]
    fn test_invalid_upstream_scheme() {
        let result = GatewayConfig::builder()
            .server(ServerConfig {
                upstream_url: Some("ftp://renderer".to_string()),
                ..Default::default()
            })
            .build_validated();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "server.upstream_url"
        ));
    }

    #[test]
    fn test_invalid_segment() {
        for segment in ["", "a/b", "my page"] {
            let result = GatewayConfig::builder()
                .permalink(PermalinkConfig {
                    segment: segment.to_string(),
                    ..Default::default()
                })
                .build_validated();
            assert!(
                matches!(
                    result,
                    Err(ConfigError::InvalidValue { ref field, .. }) if field == "permalink.segment"
                ),
                "segment {segment:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_custom_segment_is_valid() {
        let config = GatewayConfig::builder()
            .permalink(PermalinkConfig {
                segment: "p".to_string(),
                ..Default::default()
            })
            .build_validated()
            .unwrap();
        assert_eq!(config.permalink.segment, "p");
    }

    #[test]
    fn test_blank_script_name_rejected() {
        let result = GatewayConfig::builder()
            .permalink(PermalinkConfig {
                script_name: Some("  ".to_string()),
                ..Default::default()
            })
            .build_validated();
        assert!(result.is_err());
    }

    #[test]
    fn test_unsorted_buckets_rejected() {
        let mut config = GatewayConfig::default();
        config.telemetry.metrics.histogram_buckets = vec![0.5, 0.1];
        assert!(config.validate().is_err());

        config.telemetry.metrics.histogram_buckets.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_http_addr_parses() {
        let config = GatewayConfig::default();
        assert_eq!(config.http_addr().unwrap().port(), 8080);
    }
}
