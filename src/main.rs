mod blocks;
mod config;
mod error;
mod message;
mod notion;
mod properties;
mod server;
mod storage;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mail2notion=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Notion database: {}", config.notion.database_id);
    info!(
        "  Blob container: {}/{}",
        config.blob.account, config.blob.container
    );

    let bind_addr = config.server.bind_addr.clone();
    let state = Arc::new(AppState::new(config));

    info!("Relay is starting...");
    server::run(state, &bind_addr).await
}
