//! InventoryClient trait for mocking
//!
//! This trait abstracts the inventory service so the boot server can run
//! against the HTTP client in production and a static inventory in tests.

use crate::error::InventoryError;
use crate::models::NodeIdentity;
use std::net::IpAddr;

/// Trait for inventory lookups
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait InventoryClientTrait: Send + Sync {
    /// Node booting from `addr`, with its group memberships
    async fn resolve_address(&self, addr: IpAddr) -> Result<Option<NodeIdentity>, InventoryError>;

    /// Node owning the interface with MAC `mac`
    async fn resolve_mac(&self, mac: &str) -> Result<Option<String>, InventoryError>;

    /// Group labels of node `id`; empty when the node is unknown
    async fn groups_for(&self, id: &str) -> Result<Vec<String>, InventoryError>;
}
