use anyhow::Context;
use clap::Parser;
use doc_summary_backend::config::AppConfig;
use doc_summary_backend::infrastructure::storage;
use doc_summary_backend::services::cache::MemoryCache;
use doc_summary_backend::services::document_service::DocumentService;
use doc_summary_backend::services::summarizer::HttpSummarizer;
use doc_summary_backend::services::worker::CacheSweeper;
use doc_summary_backend::{AppState, create_app};
use dotenvy::dotenv;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the API server to
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port for the API server
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment & Logging
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_summary_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Document Summary Backend...");

    let config = AppConfig::from_env();
    config.validate().context("invalid configuration")?;
    info!(
        "🗂️  Dedup Config: TTL={:?}, Single-flight={}, Prefix={}, Max Size={}MB",
        config.cache_ttl,
        config.single_flight,
        config.upload_prefix,
        config.max_file_size / 1024 / 1024
    );

    // 2. Services
    let storage_service = storage::setup_storage(&config).await?;
    let cache = Arc::new(MemoryCache::new());
    let documents = Arc::new(DocumentService::new(
        cache,
        storage_service.clone(),
        &config,
    ));
    let summarizer = Arc::new(
        HttpSummarizer::from_config(&config).context("failed to build summarizer client")?,
    );
    info!(
        "🧠 Summarizer: {} (timeout {:?})",
        summarizer.endpoint(),
        config.summarizer_timeout
    );

    // 3. Shutdown channel & cache sweeper
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let sweeper = CacheSweeper::new(
        documents.clone(),
        config.cache_sweep_interval,
        shutdown_rx,
    );
    let sweeper_handle = tokio::spawn(sweeper.run());

    // 4. HTTP server
    let state = AppState {
        documents,
        summarizer,
        storage: storage_service,
        config: config.clone(),
    };

    let app = create_app(state);
    let addr = SocketAddr::new(args.host, args.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("✅ API Server listening on: http://{}", addr);
    info!("📖 Swagger UI documentation: http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await?;

    let _ = sweeper_handle.await;
    info!("👋 Backend exited cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, initiating graceful shutdown...");
        },
    }
}
