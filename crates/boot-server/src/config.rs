//! Server configuration
//!
//! Loaded from environment variables with defaults suitable for a
//! single-node deployment.

use crate::error::ServerError;
use std::net::SocketAddr;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:27778";
const DEFAULT_DATABASE_URL: &str = "sqlite://bss.db";

/// Which `BootParamsStore` backend to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Volatile, lost on restart
    Memory,
    /// Persistent SQLite database
    Sqlite,
}

/// Boot server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub store_backend: StoreBackend,
    pub database_url: String,
    /// Inventory service base URL; `None` disables address and MAC resolution
    pub inventory_url: Option<String>,
    pub inventory_token: Option<String>,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServerError> {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let listen_addr: SocketAddr = value("BSS_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse()
            .map_err(|e| ServerError::Configuration(format!("invalid BSS_LISTEN_ADDR: {e}")))?;

        let store_backend = match value("BSS_STORE_BACKEND").as_deref() {
            None | Some("memory") => StoreBackend::Memory,
            Some("sqlite") => StoreBackend::Sqlite,
            Some(other) => {
                return Err(ServerError::Configuration(format!(
                    "unknown BSS_STORE_BACKEND '{other}' (expected 'memory' or 'sqlite')"
                )));
            }
        };

        Ok(Self {
            listen_addr,
            store_backend,
            database_url: value("BSS_DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            inventory_url: value("BSS_INVENTORY_URL"),
            inventory_token: value("BSS_INVENTORY_TOKEN"),
        })
    }
}
