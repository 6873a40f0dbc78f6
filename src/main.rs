//! Bluecarbon Registry Daemon
//!
//! Serves the registration intake API backed by local evidence storage and
//! a SQLite record store.
//!
//! ## Usage
//!
//! ```bash
//! # Start with defaults
//! bluecarbon-registry
//!
//! # Start with custom config
//! bluecarbon-registry --config /path/to/config.toml
//!
//! # Start with custom HTTP port
//! bluecarbon-registry --http-port 8087
//!
//! # Start with custom data directory
//! bluecarbon-registry --data-dir /data/registry
//! ```
//!
//! ## HTTP API
//!
//! - `POST /api/projects`      - Submit a registration (multipart)
//! - `GET  /api/projects/{id}` - Look up a submission summary
//! - `GET  /health`            - Health check

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bluecarbon_registry::{BlobStore, Config, Gateway, HttpServer, RegistryDb};

#[derive(Parser, Debug)]
#[command(name = "bluecarbon-registry")]
#[command(about = "Registration intake service for coastal blue-carbon restoration projects")]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory for blobs, records and drafts
    #[arg(long, env = "REGISTRY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// HTTP port for the intake API
    #[arg(long, env = "REGISTRY_HTTP_PORT")]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("bluecarbon_registry=info".parse()?),
        )
        .init();

    let args = Args::parse();

    // Load config
    let mut config = if let Some(config_path) = &args.config {
        Config::load(config_path)?
    } else {
        Config::default()
    };

    // Apply CLI overrides
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(port) = args.http_port {
        config.http_port = port;
    }

    info!(
        data_dir = %config.data_dir.display(),
        http_port = config.http_port,
        "Starting bluecarbon-registry"
    );

    // Ensure data directory exists
    tokio::fs::create_dir_all(&config.data_dir).await?;

    // Save default config if it doesn't exist
    let config_path = config.config_path();
    if !config_path.exists() {
        config.save(&config_path)?;
        info!(path = %config_path.display(), "Created default config");
    }

    // Initialize stores
    let blob_store = Arc::new(BlobStore::new(config.blobs_dir()).await?);
    let db = Arc::new(RegistryDb::open(&config.registry_db_path())?);
    let gateway = Arc::new(Gateway::new(db.clone(), blob_store.clone()));

    let http_addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    let http_server = Arc::new(HttpServer::new(
        gateway,
        http_addr,
        config.max_payload_bytes,
    ));

    info!("Intake API available at http://{}", http_addr);
    info!("Endpoints:");
    info!("  POST /api/projects       - Submit a registration");
    info!("  GET  /api/projects/{{id}}  - Look up a submission");
    info!("  GET  /health             - Health check");
    info!("Press Ctrl+C to stop.");

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutting down...");
    };

    tokio::select! {
        result = http_server.run() => {
            if let Err(e) = result {
                error!(error = %e, "HTTP server error");
            }
        }
        _ = shutdown => {}
    }

    // Print stats before exit
    if let Ok(stats) = db.stats() {
        info!(
            projects = stats.project_count,
            pending = stats.pending_count,
            "Final registry stats"
        );
    }
    if let Ok(stats) = blob_store.stats().await {
        info!(
            blobs = stats.total_blobs,
            bytes = stats.total_bytes,
            "Final blob store stats"
        );
    }

    Ok(())
}
