use std::sync::Arc;

use anyhow::Context;
use converter_backend::app;
use converter_backend::config::settings::AppConfig;
use converter_backend::infrastructure::converter::{ConverterGateway, LibreOfficeGateway, SofficeLocator};
use converter_backend::infrastructure::storage::local::StorageService;
use converter_backend::modules::conversion::repository::JobStore;
use converter_backend::state::AppState;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting File Converter Backend Server...");

    let config = AppConfig::new();
    let storage = StorageService::new(&config.upload_dir, &config.converted_dir).await?;

    let converter = LibreOfficeGateway::new(
        SofficeLocator::new(config.soffice_path.clone()),
        config.conversion_timeout(),
    );
    match converter.locate() {
        Some(path) => info!(path = %path.display(), "LibreOffice found"),
        None => warn!("LibreOffice not found! Please install it from https://www.libreoffice.org/download/"),
    }

    let address = config.bind_address();
    let state = AppState::new(config, JobStore::new(), storage, Arc::new(converter));
    let app = app::create_app(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Server running on http://{}", address);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
