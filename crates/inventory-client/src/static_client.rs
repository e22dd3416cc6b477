//! Static in-memory inventory
//!
//! Used when no inventory service is configured (no address or MAC
//! resolution is possible) and as the inventory double in unit tests.

use crate::error::InventoryError;
use crate::inventory_trait::InventoryClientTrait;
use crate::models::{NodeIdentity, normalize_mac};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Inventory {
    addresses: HashMap<IpAddr, String>,
    macs: HashMap<String, String>,
    groups: HashMap<String, Vec<String>>,
}

/// Inventory backed by in-memory maps
///
/// Clones share the same maps.
#[derive(Debug, Clone, Default)]
pub struct StaticInventoryClient {
    inventory: Arc<RwLock<Inventory>>,
}

impl StaticInventoryClient {
    /// Create an empty inventory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node address (for test setup)
    pub fn add_address(&self, addr: IpAddr, id: impl Into<String>) {
        self.write().addresses.insert(addr, id.into());
    }

    /// Register a node MAC (for test setup)
    pub fn add_mac(&self, mac: &str, id: impl Into<String>) -> Result<(), InventoryError> {
        let mac = normalize_mac(mac)?;
        self.write().macs.insert(mac, id.into());
        Ok(())
    }

    /// Set the group labels of a node (for test setup)
    pub fn set_groups(&self, id: impl Into<String>, groups: Vec<String>) {
        self.write().groups.insert(id.into(), groups);
    }

    // Every mutation is a single map insert, so a poisoned lock still
    // guards consistent maps.
    fn write(&self) -> RwLockWriteGuard<'_, Inventory> {
        self.inventory.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T>(&self, f: impl FnOnce(&Inventory) -> T) -> T {
        f(&self.inventory.read().unwrap_or_else(PoisonError::into_inner))
    }
}

#[async_trait::async_trait]
impl InventoryClientTrait for StaticInventoryClient {
    async fn resolve_address(&self, addr: IpAddr) -> Result<Option<NodeIdentity>, InventoryError> {
        Ok(self.read(|inventory| {
            inventory.addresses.get(&addr).map(|id| NodeIdentity {
                id: id.clone(),
                groups: inventory.groups.get(id).cloned().unwrap_or_default(),
            })
        }))
    }

    async fn resolve_mac(&self, mac: &str) -> Result<Option<String>, InventoryError> {
        let mac = normalize_mac(mac)?;
        Ok(self.read(|inventory| inventory.macs.get(&mac).cloned()))
    }

    async fn groups_for(&self, id: &str) -> Result<Vec<String>, InventoryError> {
        Ok(self.read(|inventory| inventory.groups.get(id).cloned().unwrap_or_default()))
    }
}
