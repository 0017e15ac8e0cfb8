//! SockJS echo server.
//!
//! Mounts the echo application at the configured prefix and serves both
//! WebSocket transports until SIGINT or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use sockjs_server::config::watcher::ConfigWatcher;
use sockjs_server::lifecycle::{signals, startup};
use sockjs_server::observability::{logging, metrics};
use sockjs_server::{Echo, Shutdown, SockJsServer};

#[derive(Parser)]
#[command(name = "sockjs-server")]
#[command(about = "SockJS WebSocket server running the echo application", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the config file when it changes.
    #[arg(long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let prepared = startup::prepare(cli.config.as_deref())?;

    logging::init(&prepared.config.observability);
    prepared.announce();
    let startup::Prepared { config, registry } = prepared;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // The watcher stops when dropped, so it lives until main returns.
    let (_watcher, config_updates) = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => {
            let (_tx, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        prefix = %config.prefix,
        max_connections = config.listener.max_connections,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server = SockJsServer::new(config, registry, Arc::new(Echo));
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move { signals::forward_to(&shutdown).await });

    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
