//! Bracket Server
//!
//! Single-elimination tournament brackets over HTTP, with a WebSocket event
//! stream and signed event webhooks.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use bracket_core::BracketService;
use bracket_core::config::ConfigStore;
use bracket_core::persistence::Snapshot;
use bracket_core::processors::{EventRelay, RankingBoard, SnapshotWriter, WebhookNotifier};
use clap::Parser;
use config::ConfigLoader;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// How long processors get to drain after shutdown is signaled.
const PROCESSOR_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Bracket Server - single-elimination tournament engine
#[derive(Parser, Debug)]
#[command(name = "bracket-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "BRACKET_CONFIG", default_value = "./bracket-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting bracket-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    let listen_addr = loaded_config.server.listen;
    let persistence = loaded_config.persistence.clone();
    tracing::info!("Configuration loaded from {:?}", args.config);

    // Restore state
    let service = match &persistence.snapshot_path {
        Some(path) => match Snapshot::load(path).await? {
            Some(snapshot) => BracketService::restore(loaded_config.engine.clone(), snapshot)?,
            None => {
                tracing::info!(path = %path.display(), "No snapshot found, starting empty");
                BracketService::new(loaded_config.engine.clone())
            }
        },
        None => BracketService::new(loaded_config.engine.clone()),
    };
    let rankings = Arc::new(RankingBoard::new());
    rankings.replay(&service.list_tournaments().await).await;

    // Spawn processors
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let notifier_config = ConfigStore::new(loaded_config.notifier);

    let relay = EventRelay::new(
        Arc::new(WebhookNotifier::new(notifier_config.clone())),
        service.clone(),
    );
    let relay_handle = tokio::spawn(relay.run(shutdown_rx.clone(), service.subscribe()));

    let rankings_handle = {
        let board = rankings.clone();
        let event_rx = service.subscribe();
        let shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move { board.run(shutdown_rx, event_rx).await })
    };

    let writer_handle = persistence.snapshot_path.map(|path| {
        let writer = SnapshotWriter::new(service.clone(), path, persistence.snapshot_interval)
            .assume_written();
        tokio::spawn(writer.run(shutdown_rx.clone()))
    });

    let state = AppState::new(service.clone(), rankings, notifier_config.clone());

    // Spawn config reload handler (listens for SIGHUP)
    let reload_notify = spawn_config_reload_handler(config_loader, notifier_config);

    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Stop background tasks
    reload_notify.notify_one();
    let _ = shutdown_tx.send(true);
    let drained = tokio::time::timeout(PROCESSOR_DRAIN_TIMEOUT, async {
        let _ = relay_handle.await;
        let _ = rankings_handle.await;
    })
    .await;
    if drained.is_err() {
        tracing::warn!("Processors did not stop in time, pending deliveries dropped");
    }

    // Final snapshot write, outside the drain timeout.
    if let Some(handle) = writer_handle {
        let _ = handle.await;
    }

    tracing::info!("Server shutdown complete");
    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bracket_core=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
