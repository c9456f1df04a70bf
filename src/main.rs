//! prefix-proxy binary.
//!
//! Loads the configuration (or the built-in reference table), binds the
//! listener and relays until SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use prefix_proxy::config::{load_config, validate_config, ConfigError, ProxyConfig};
use prefix_proxy::lifecycle::signals::wait_for_signal;
use prefix_proxy::observability::{logging, metrics};
use prefix_proxy::{HttpServer, Shutdown};

/// How long in-flight relays may keep running after a shutdown signal.
const DRAIN_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "prefix-proxy", version)]
#[command(about = "Development reverse proxy with a static path-prefix routing table", long_about = None)]
struct Cli {
    /// TOML configuration file; the reference routing table is used if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "prefix-proxy starting"
    );

    if config.observability.metrics_enabled {
        // Already checked by validation; a bind failure here is fatal.
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    for route in &config.routes {
        tracing::info!(
            prefix = %route.prefix,
            upstream = %route.upstream,
            strip_prefix = route.strip_prefix,
            "Route configured"
        );
    }

    let server = HttpServer::new(config.clone())?;
    let tracker = server.tracker();

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let mut server_task = tokio::spawn(server.run(listener, server_shutdown));

    tokio::select! {
        result = &mut server_task => {
            // The server only returns on its own when the listener fails.
            result??;
            return Ok(());
        }
        _ = wait_for_signal() => {}
    }

    shutdown.trigger();
    match tokio::time::timeout(DRAIN_DEADLINE, &mut server_task).await {
        Ok(result) => result??,
        Err(_) => {
            tracing::warn!(
                in_flight = tracker.active_count(),
                "Drain deadline passed; closing remaining relays"
            );
            server_task.abort();
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
