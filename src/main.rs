use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use shorts_ranking_backend::api::{self, AppState};
use shorts_ranking_backend::config::ShortsConfig;
use shorts_ranking_backend::external::ReqwestHttpClient;
use shorts_ranking_backend::services::{FetchOrchestrator, FileStore, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration (.env + environment)
    let config = ShortsConfig::from_env();
    config.validate()?;
    if !config.has_credential() {
        tracing::warn!("YOUTUBE_API_KEY is not set, sample videos will be served");
    }

    // Initialize cache storage
    let store = FileStore::new(config.cache.cache_dir.clone()).await?;

    let http = ReqwestHttpClient::new(config.request_timeout())?;
    let host = config.server.host.clone();
    let port = config.server.port;

    let orchestrator = Arc::new(FetchOrchestrator::new(
        Arc::new(config),
        Arc::new(store),
        Arc::new(http),
        Arc::new(SystemClock),
    ));

    // Warm the cache in the background
    let warmup = orchestrator.clone();
    tokio::spawn(async move {
        match warmup.load().await {
            Ok(Some(feed)) => tracing::info!(
                "Warm-up loaded {} shorts ({:?})",
                feed.items.len(),
                feed.source
            ),
            Ok(None) => {}
            Err(e) => tracing::warn!("Warm-up load failed: {}", e),
        }
    });

    let app = api::router(AppState { orchestrator });

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("🚀 Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
