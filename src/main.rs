use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::router;
use crate::config::AppConfig;
use crate::portfolio::PortfolioLedger;
use crate::store::SnapshotStore;

mod api;
mod config;
mod data;
mod error;
mod portfolio;
mod store;
#[cfg(test)]
mod tests;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let store = SnapshotStore::new(&config.data_file)?;
    let ledger = Arc::new(RwLock::new(PortfolioLedger::load(store)));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Portfolio API listening on {}", config.bind_addr);

    axum::serve(listener, router(ledger.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Final save so nothing is lost if the last mutation's save failed.
    ledger.read().await.persist();
    info!("Shutdown complete, portfolio saved");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
