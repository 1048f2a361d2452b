//! Configuration for the permalink gateway.
//!
//! Configuration is loaded in layers (defaults or a preset, then a TOML or
//! JSON file, then environment variables) and validated once at the end.
//! Unknown fields in files are rejected.
//!
//! # Example file
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! upstream_url = "http://127.0.0.1:8081"
//!
//! [permalink]
//! segment = "page"
//! script_name = "index.php"
//! trust_forwarded_proto = true
//!
//! [site]
//! snapshot_path = "/var/lib/permalink/site.json"
//!
//! [telemetry.logging]
//! level = "info,permalink_core=debug"
//! format = "json"
//! ```
//!
//! # Environment variables
//!
//! Every scalar field can be overridden as `PERMALINK__SECTION__KEY`, e.g.
//! `PERMALINK__PERMALINK__SEGMENT=p` or
//! `PERMALINK__TELEMETRY__LOGGING__LEVEL=debug`. An empty value clears an
//! optional field.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{GatewayConfig, GatewayConfigBuilder};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{
    LogFormat, LoggingConfig, MetricsConfig, PermalinkConfig, ServerConfig, SiteConfig,
    TelemetryConfigSection,
};
