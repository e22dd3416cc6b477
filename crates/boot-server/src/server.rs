//! Main boot server implementation.
//!
//! This module builds the store and inventory collaborators from
//! configuration, assembles the router and runs it until shutdown.

use crate::config::{ServerConfig, StoreBackend};
use crate::error::ServerError;
use crate::{api, http, legacy};
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, put};
use bootparams::{BootParamsStore, MemoryStore, SqliteStore};
use inventory_client::{InventoryClient, InventoryClientTrait, StaticInventoryClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BootParamsStore>,
    pub inventory: Arc<dyn InventoryClientTrait>,
}

impl AppState {
    pub fn new(store: Arc<dyn BootParamsStore>, inventory: Arc<dyn InventoryClientTrait>) -> Self {
        Self { store, inventory }
    }
}

/// Builds the HTTP router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(api::healthz))
        .route(
            "/bootparams",
            get(api::get_bootparams)
                .post(api::create_bootparams)
                .put(api::update_bootparams)
                .delete(api::delete_bootparams),
        )
        .route("/bootparams/history", get(api::get_history))
        .route("/bootparams/default", put(api::set_default))
        .route("/bootparams/ids", get(api::list_ids))
        .route("/groups/{group}", get(api::get_group_binding))
        .route(
            "/groups/{group}/template",
            get(api::get_group_template)
                .put(api::assign_group_template)
                .delete(api::unassign_group_template),
        )
        .route("/bootscript", get(http::bootscript))
        .route(
            "/bootparameters",
            get(legacy::get_v1)
                .put(legacy::put_v1)
                .post(legacy::put_v1)
                .delete(legacy::delete_v1),
        )
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Boot parameter HTTP server.
pub struct BootServer {
    config: ServerConfig,
    state: AppState,
}

impl BootServer {
    /// Creates a server, opening the configured store and inventory client.
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let store: Arc<dyn BootParamsStore> = match config.store_backend {
            StoreBackend::Memory => {
                warn!("Using in-memory boot parameter store; state is lost on restart");
                Arc::new(MemoryStore::new())
            }
            StoreBackend::Sqlite => Arc::new(SqliteStore::open(&config.database_url).await?),
        };

        let inventory: Arc<dyn InventoryClientTrait> = match &config.inventory_url {
            Some(url) => {
                info!("Using inventory service at {}", url);
                Arc::new(InventoryClient::new(url.clone(), config.inventory_token.clone())?)
            }
            None => {
                warn!("No inventory service configured; address and MAC resolution disabled");
                Arc::new(StaticInventoryClient::new())
            }
        };

        Ok(Self {
            config,
            state: AppState::new(store, inventory),
        })
    }

    /// The router this server runs.
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Binds the listener and serves until Ctrl-C.
    pub async fn start(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", self.config.listen_addr))?;
        info!("Boot server listening on {}", self.config.listen_addr);

        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("boot server terminated")?;

        info!("Boot server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down boot server");
}
