//! Error types for the permalink gateway.

use http::StatusCode;
use permalink_config::ConfigError;
use permalink_core::PermalinkError;
use permalink_middleware::{Response, ResponseExt};
use permalink_telemetry::TelemetryError;
use thiserror::Error;

/// Gateway errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging or metrics could not be installed.
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// The permalink resolver could not be built.
    #[error("permalink error: {0}")]
    Permalink(#[from] PermalinkError),

    /// The site snapshot is unreadable or inconsistent.
    #[error("site snapshot error: {message}")]
    Site {
        /// Error message.
        message: String,
    },

    /// The upstream could not be reached or answered unusably.
    #[error("upstream error: {message}")]
    Upstream {
        /// Error message.
        message: String,
        /// Whether the upstream timed out.
        timed_out: bool,
    },

    /// The request could not be turned into an upstream request.
    #[error("proxy error: {message}")]
    Proxy {
        /// Error message.
        message: String,
    },

    /// Listener setup failed.
    #[error("server error: {message}")]
    Server {
        /// Error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    /// Create a site snapshot error.
    pub fn site(message: impl Into<String>) -> Self {
        Self::Site {
            message: message.into(),
        }
    }

    /// Create an upstream error.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            timed_out: false,
        }
    }

    /// Create an upstream timeout error.
    pub fn upstream_timeout(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            timed_out: true,
        }
    }

    /// Create a proxy error.
    pub fn proxy(message: impl Into<String>) -> Self {
        Self::Proxy {
            message: message.into(),
        }
    }

    /// Create a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    /// HTTP status used when this error answers a request.
    #[allow(clippy::match_same_arms)]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Upstream {
                timed_out: true, ..
            } => StatusCode::GATEWAY_TIMEOUT,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::Proxy { .. } => StatusCode::BAD_GATEWAY,
            Self::Json(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error category used as the `code` of JSON error bodies.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Telemetry(_) => "telemetry",
            Self::Permalink(_) => "permalink",
            Self::Site { .. } => "site",
            Self::Upstream { .. } => "upstream",
            Self::Proxy { .. } => "proxy",
            Self::Server { .. } => "server",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }

    /// Renders the error as a JSON error response.
    pub fn to_response(&self) -> Response {
        Response::json_error(self.status_code(), self.category(), &self.to_string())
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GatewayError::upstream("connection refused").status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GatewayError::upstream_timeout("slow").status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            GatewayError::site("bad uid").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display_and_category() {
        let err = GatewayError::site("page_id 0");
        assert_eq!(err.to_string(), "site snapshot error: page_id 0");
        assert_eq!(err.category(), "site");

        let err: GatewayError = ConfigError::unsupported_format("yaml").into();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_to_response() {
        let response = GatewayError::upstream("refused").to_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }
}
