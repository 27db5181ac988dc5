//! First-party analytics proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────────┐
//!                       │                  ANALYTICS PROXY                     │
//!                       │                                                      │
//!   Client Request      │  ┌───────────┐   ┌───────────┐   ┌──────────────┐    │
//!   ────────────────────┼─▶│ request id│──▶│   host    │──▶│   routing    │    │
//!                       │  │  + trace  │   │ allowlist │   │  classifier  │    │
//!                       │  └───────────┘   └───────────┘   └──────┬───────┘    │
//!                       │                                         │            │
//!                       │               OPTIONS / 404 ◀───────────┤            │
//!                       │                                         ▼            │
//!   Client Response     │  ┌───────────┐   ┌───────────┐   ┌──────────────┐    │
//!   ◀───────────────────┼──│ response  │◀──│ CORS +    │◀──│  upstream    │◀───┼── Analytics
//!                       │  │ assembly  │   │ security  │   │  forwarder   │    │   collector
//!                       │  └───────────┘   └───────────┘   └──────────────┘    │
//!                       └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use analytics_proxy::config::{load_config, ConfigOverrides};
use analytics_proxy::lifecycle::startup;
use analytics_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "analytics-proxy", version)]
#[command(about = "First-party reverse proxy for a hosted analytics collector", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "ANALYTICS_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:8080.
    #[arg(long, env = "BIND_ADDRESS")]
    bind: Option<String>,

    /// Base URL of the analytics collector.
    #[arg(long, env = "UPSTREAM")]
    upstream: Option<String>,

    /// Comma-separated hosts this proxy may serve. Unset means any host.
    #[arg(long, env = "ALLOW_HOSTS")]
    allow_hosts: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        bind_address: cli.bind,
        upstream: cli.upstream,
        allow_hosts: cli.allow_hosts,
    };
    let config = load_config(cli.config.as_deref(), &overrides)?;

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        restricted = !config.access.allow_hosts.is_empty(),
        "analytics-proxy starting"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
