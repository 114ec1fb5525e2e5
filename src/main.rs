//! dehaze-server
//!
//! ```text
//!   client ──▶ listener ──▶ middleware ──▶ dispatch ──▶ URL table ──▶ view
//!                          (request id,     (resolve,     (first        │
//!                           trace, limits)   301, 404)     match)       ▼
//!                                                              frames / media /
//!                                                              location stores
//!
//!   config file ──▶ watcher ──▶ route toggles swapped in live
//!   SIGINT/SIGTERM ──▶ shutdown broadcast ──▶ feeds closed, requests drained
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use dehaze_server::admin;
use dehaze_server::config::{load_config, watcher::ConfigWatcher, ServerConfig};
use dehaze_server::lifecycle::{wait_for_signal, Shutdown};
use dehaze_server::observability::{logging, metrics};
use dehaze_server::HttpServer;

#[derive(Parser)]
#[command(name = "dehaze-server", version, about = "Frame, upload and location ingestion server")]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload route toggles when the configuration file changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "dehaze-server starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        media_root = %config.media.root,
        disabled_routes = ?config.routes.disabled,
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

    // Hold the watcher for the lifetime of the process.
    let (_watcher, config_updates) = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;

    let admin_task = if server.config().admin.enabled {
        let admin_listener = TcpListener::bind(&server.config().admin.bind_address).await?;
        Some(tokio::spawn(admin::serve(
            admin_listener,
            server.state().clone(),
            shutdown.subscribe(),
        )))
    } else {
        None
    };

    let mut server_task = tokio::spawn(server.run(listener, config_updates, shutdown.subscribe()));

    let server_result = tokio::select! {
        _ = wait_for_signal() => {
            shutdown.trigger();
            server_task.await
        }
        result = &mut server_task => {
            tracing::error!("HTTP server exited unexpectedly");
            shutdown.trigger();
            result
        }
    };
    server_result??;
    if let Some(task) = admin_task {
        task.await??;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
