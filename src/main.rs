use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use message_relay::config::{self, RelayConfig, StoreBackend};
use message_relay::http::HttpServer;
use message_relay::ingest::{IngestListener, IngestServer};
use message_relay::lifecycle::Shutdown;
use message_relay::store::{DocumentStore, MemoryStore, MongoStore};

#[derive(Debug, Parser)]
#[command(name = "message-relay", about = "Relay HTTP form submissions to a document store")]
struct Args {
    /// Path to the TOML config file; defaults apply when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "message_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("message-relay v0.1.0 starting");

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => RelayConfig::default(),
    };

    tracing::info!(
        ingest_address = %config.ingest.bind_address,
        http_address = %config.http.bind_address,
        store_backend = ?config.store.backend,
        "Configuration loaded"
    );

    let store: Arc<dyn DocumentStore> = match config.store.backend {
        StoreBackend::Mongodb => Arc::new(MongoStore::connect(&config.store).await?),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };

    let shutdown = Shutdown::new();

    // Bind both listeners up front so startup failures surface here.
    let ingest_listener = IngestListener::bind(&config.ingest).await?;
    let http_listener = TcpListener::bind(&config.http.bind_address).await?;

    let ingest_server = IngestServer::new(config.ingest.clone(), store);
    let ingest_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { ingest_server.serve(ingest_listener, shutdown).await }
    });

    let http_server = HttpServer::new(&config);
    let http_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { http_server.run(http_listener, shutdown).await }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    shutdown.trigger();

    http_task.await??;
    ingest_task.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
