use stocksense::{
    api::start_server,
    config::AppConfig,
    repository::DatasetRepository,
    QueryEngine,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    info!("🚀 StockSense - API Server");
    info!("📍 Port: {}", config.port);

    let dataset = DatasetRepository::for_path(&config.data_file).load()?;
    let engine = QueryEngine::new(config.engine_config()?);

    info!("✅ Engine initialized ({} stocks)", dataset.len());
    info!("📡 Starting API server...");

    start_server(Arc::new(engine), Arc::new(dataset), config.port).await?;

    Ok(())
}
