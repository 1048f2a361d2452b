//! Permalink gateway entry point.

use std::path::PathBuf;

use anyhow::Context;
use permalink_config::{ConfigLoader, DEFAULT_ENV_PREFIX};
use permalink_gateway::{telemetry_config, GatewayServer, Site};
use tracing::info;

/// Configuration file read when `--config` is not given, if present.
const DEFAULT_CONFIG_FILE: &str = "permalink.toml";

/// Command-line arguments.
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("permalink-gateway {}", permalink_gateway::VERSION);
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config }
    }
}

fn print_help() {
    println!(
        r"Permalink gateway - redirects /page/<id>/ to the page's speaking URL

USAGE:
    permalink-gateway [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file (TOML or JSON)
                           [default: ./permalink.toml if it exists]
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    PERMALINK__SERVER__HTTP_ADDR                Listen address (default: 0.0.0.0:8080)
    PERMALINK__SERVER__UPSTREAM_URL             Renderer for non-permalink requests
    PERMALINK__PERMALINK__SEGMENT               Permalink segment (default: page)
    PERMALINK__PERMALINK__SCRIPT_NAME           Front controller for self URLs
    PERMALINK__PERMALINK__TRUST_FORWARDED_PROTO Honor X-Forwarded-Proto
    PERMALINK__SITE__SNAPSHOT_PATH              JSON site snapshot
    PERMALINK__TELEMETRY__LOGGING__LEVEL        Log filter (default: info)

    A .env file in the working directory is loaded first.

EXAMPLES:
    permalink-gateway --config /etc/permalink/gateway.toml

    PERMALINK__SERVER__UPSTREAM_URL=http://127.0.0.1:8081 permalink-gateway
"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loader = ConfigLoader::new().with_production().with_dotenv()?;
    let loader = match &args.config {
        Some(path) => loader
            .with_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => loader.with_optional_file(DEFAULT_CONFIG_FILE)?,
    };
    let config = loader
        .with_env_prefix(DEFAULT_ENV_PREFIX)
        .load()
        .context("invalid configuration")?;

    permalink_telemetry::init_telemetry(&telemetry_config(&config))
        .context("failed to initialize telemetry")?;

    info!(
        version = permalink_gateway::VERSION,
        environment = %config.telemetry.environment,
        "starting permalink gateway"
    );

    let site = Site::load(&config.site).context("failed to load site snapshot")?;
    let server = GatewayServer::new(config, site).context("failed to build gateway")?;
    server.run().await.context("gateway stopped with an error")?;

    info!("permalink gateway stopped");
    Ok(())
}
