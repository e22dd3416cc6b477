//! Boot Server
//!
//! Serves versioned boot parameters and iPXE boot scripts for netbooting
//! cluster nodes.

use anyhow::{Context, Result};
use boot_server::{BootServer, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Boot Server");

    let config = ServerConfig::from_env().context("failed to load configuration")?;

    info!("Configuration:");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Store backend: {:?}", config.store_backend);
    info!(
        "  Inventory: {}",
        config.inventory_url.as_deref().unwrap_or("none")
    );

    let server = BootServer::new(config)
        .await
        .context("failed to initialize boot server")?;
    server.start().await
}
