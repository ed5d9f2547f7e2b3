//! siren-mount server.
//!
//! Serves a tree of mounted sub-apps described by a TOML mount table.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server (request id, trace, timeout, body limit)
//!                        │
//!                        ▼
//!                     root App ──▶ Mount("/api/:version") ──▶ sub App
//!                        │              │ path = "/users/42"     │
//!                        │              │ params = {version}     ▼
//!                        │              │                   Mount("/users/:id")
//!                        │              ◀──── restore ───────────┘
//!                        ▼
//!     Client Response ◀─ context → response
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use siren_mount::config::{load_config, ServerConfig};
use siren_mount::handlers::build_app;
use siren_mount::http::HttpServer;
use siren_mount::lifecycle::{signals, Shutdown};
use siren_mount::observability::init_logging;

#[derive(Parser)]
#[command(name = "siren-mount")]
#[command(about = "Serve mounted sub-apps from a TOML mount table", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    let app = build_app(&config.mounts)?;

    if cli.check {
        println!(
            "configuration ok: {} top-level mount(s)",
            config.mounts.len()
        );
        return Ok(());
    }

    init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "siren-mount starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        mounts = config.mounts.len(),
        request_timeout_secs = config.timeouts.request_secs,
        max_body_bytes = config.limits.max_body_bytes,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let _signals = signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(app, config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
