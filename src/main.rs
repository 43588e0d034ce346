use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod config;
mod error;
mod models;
mod services;
mod storage;
mod web;

use crate::config::Config;
use crate::services::wallet::spawn_wallet_watcher;
use crate::web::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration and wrap in Arc
    let config = Arc::new(Config::load()?);
    info!("Configuration loaded successfully");

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("Failed to create data directory {}", config.data_dir.display()))?;
    let store = storage::open_store(config.store_backend, &config.data_dir)
        .context("Failed to open token store")?;
    info!("Store ready ({:?} backend)", config.store_backend);

    let state = AppState::new(store, config.clone());
    if config.seed_sample_tokens && state.registry.seed_if_empty() {
        info!("Sample tokens written");
    }
    if let Some(address) = state.wallet.address().await {
        info!("Restored wallet session for {}", services::wallet::short_address(&address));
    }

    let watcher = spawn_wallet_watcher(
        state.wallet.clone(),
        Duration::from_millis(config.wallet_poll_interval_ms.max(1)),
        state.ws_tx.clone(),
    );

    info!("Starting pump-steamm launchpad...");
    let result = web::server::start_server(state, config).await;

    watcher.abort();
    info!("Launchpad stopped");
    result
}
