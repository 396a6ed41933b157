//! dustgate: a compiling gate in front of a template-serving application.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                 DUSTGATE                      │
//!                      │                                               │
//!   Client Request     │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!   ──────────────────▶│  │  http   │───▶│  filter  │───▶│ forward │──┼──▶ Upstream
//!                      │  │ server  │    │ pipeline │    │ handler │  │    Application
//!                      │  └─────────┘    └────┬─────┘    └─────────┘  │
//!                      │                      │                       │
//!                      │            ┌─────────┴─────────┐             │
//!                      │            ▼                   ▼             │
//!                      │      ┌──────────┐       ┌────────────┐       │
//!   Client Response    │      │ compiler │       │   cache    │       │
//!   ◀──────────────────┼──────│  (port)  │       │  (scopes)  │       │
//!                      │      └──────────┘       └────────────┘       │
//!                      │                                               │
//!                      │  ┌─────────────────────────────────────────┐ │
//!                      │  │        Cross-Cutting Concerns            │ │
//!                      │  │  ┌────────┐ ┌──────────────┐ ┌───────┐  │ │
//!                      │  │  │ config │ │observability │ │ admin │  │ │
//!                      │  │  └────────┘ └──────────────┘ └───────┘  │ │
//!                      │  └─────────────────────────────────────────┘ │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use dustgate::admin::{setup_admin_router, AdminState};
use dustgate::compiler::DustcProvider;
use dustgate::config::loader::load_config;
use dustgate::config::GateConfig;
use dustgate::observability::{logging, metrics};
use dustgate::HttpServer;

#[derive(Parser)]
#[command(name = "dustgate", about = "Template-compiling reverse proxy", version)]
struct Cli {
    /// Path to the TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // An invalid config must never enter service: load and validate before
    // anything binds.
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GateConfig::default(),
    };

    logging::init(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        mount_prefix = %config.filter.mount_prefix,
        cache_enabled = config.filter.cache_enabled,
        etag_enabled = config.filter.etag_enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let provider = Box::new(DustcProvider::new(config.compiler.clone()));
    let server = HttpServer::new(config, provider)?;

    if server.config().admin.enabled {
        let admin_config = server.config().admin.clone();
        let state = AdminState {
            scopes: server.filter().scopes.clone(),
            api_key: admin_config.api_key.into(),
        };
        let admin_listener = TcpListener::bind(&admin_config.bind_address).await?;
        tracing::info!(address = %admin_config.bind_address, "Admin API listening");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(admin_listener, setup_admin_router(state)).await {
                tracing::error!(error = %e, "Admin server error");
            }
        });
    }

    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
