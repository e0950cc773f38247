//! # vitrine
//!
//! Live-shopping server binary — opens the store, wires the server, and
//! runs until interrupted.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use vitrine_server::{ServerConfig, VitrineServer};
use vitrine_store::{ConnectionConfig, Store};

/// Vitrine live-shopping server.
#[derive(Parser, Debug)]
#[command(name = "vitrine", about = "Vitrine live-shopping server")]
struct Cli {
    /// Host to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind (0 for auto-assign).
    #[arg(long, default_value = "4100")]
    port: u16,

    /// Path to the `SQLite` database.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Maximum concurrent WebSocket connections.
    #[arg(long, default_value = "500")]
    max_connections: usize,
}

impl Cli {
    fn default_db_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home)
            .join(".vitrine")
            .join("database")
            .join("vitrine.db")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let db_path = cli.db_path.unwrap_or_else(Cli::default_db_path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let store = Store::open(&db_path, &ConnectionConfig::default())
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    tracing::info!(path = %db_path.display(), "database opened");

    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        max_connections: cli.max_connections,
        ..ServerConfig::default()
    };

    let metrics_handle = vitrine_server::metrics::install_recorder();
    let server = VitrineServer::new(config, store, metrics_handle);
    let (addr, serve_handle) = server.listen().await.context("failed to bind server")?;
    tracing::info!(addr = %addr, "vitrine ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl+c")?;
    tracing::info!("shutting down");
    server
        .shutdown()
        .graceful_shutdown(vec![serve_handle], None)
        .await;

    Ok(())
}
