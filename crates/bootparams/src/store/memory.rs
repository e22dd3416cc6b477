//! Volatile in-memory store
//!
//! All identifiers, legacy records and group bindings live behind one
//! reader/writer lock owned by the store instance.

use crate::error::{BootParamsError, Result};
use crate::model::BootParams;
use crate::store::BootParamsStore;
use crate::versioned::{GroupBinding, VersionedBootParams};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct State {
    params: HashMap<String, VersionedBootParams>,
    v1: HashMap<String, BootParams>,
    groups: HashMap<String, GroupBinding>,
}

/// In-memory `BootParamsStore`
///
/// Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn history<'a>(state: &'a State, id: &str) -> Result<&'a VersionedBootParams> {
    state
        .params
        .get(id)
        .ok_or_else(|| BootParamsError::NotFound(id.to_string()))
}

fn history_mut<'a>(state: &'a mut State, id: &str) -> Result<&'a mut VersionedBootParams> {
    state
        .params
        .get_mut(id)
        .ok_or_else(|| BootParamsError::NotFound(id.to_string()))
}

#[async_trait::async_trait]
impl BootParamsStore for MemoryStore {
    async fn set(&self, id: &str, params: BootParams) -> Result<BootParams> {
        params.validate()?;
        let mut state = self.state.write().await;
        if state.params.contains_key(id) {
            return Err(BootParamsError::AlreadyExists(id.to_string()));
        }
        let created = VersionedBootParams::new(params);
        let stored = created.current(id)?;
        state.params.insert(id.to_string(), created);
        info!("Created boot parameters for {}", id);
        Ok(stored)
    }

    async fn get(&self, id: &str) -> Result<BootParams> {
        debug!("Getting current boot parameters for {}", id);
        let state = self.state.read().await;
        history(&state, id)?.current(id)
    }

    async fn get_version(&self, id: &str, version: u32) -> Result<BootParams> {
        debug!("Getting boot parameters for {} version {}", id, version);
        let state = self.state.read().await;
        history(&state, id)?.version(id, version)
    }

    async fn get_default(&self, id: &str) -> Result<BootParams> {
        debug!("Getting default boot parameters for {}", id);
        let state = self.state.read().await;
        history(&state, id)?.default_params(id)
    }

    async fn get_history(&self, id: &str) -> Result<VersionedBootParams> {
        let state = self.state.read().await;
        history(&state, id).cloned()
    }

    async fn update(&self, id: &str, params: BootParams) -> Result<BootParams> {
        params.validate()?;
        let mut state = self.state.write().await;
        let stored = history_mut(&mut state, id)?.append(params);
        info!("Updated boot parameters for {} to version {}", id, stored.version);
        Ok(stored)
    }

    async fn set_default(&self, id: &str, version: u32) -> Result<()> {
        let mut state = self.state.write().await;
        history_mut(&mut state, id)?.set_default(id, version)?;
        info!("Set default boot parameters for {} to version {}", id, version);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if state.params.remove(id).is_some() {
            state.groups.retain(|_, binding| binding.id != id);
            info!("Deleted boot parameters for {}", id);
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let state = self.state.read().await;
        let mut ids: Vec<String> = state.params.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn set_v1(&self, xname: &str, mut params: BootParams) -> Result<()> {
        params.validate()?;
        params.version = 0;
        let mut state = self.state.write().await;
        state.v1.insert(xname.to_string(), params);
        info!("Stored legacy boot parameters for {}", xname);
        Ok(())
    }

    async fn set_v1_many(&self, xnames: &[String], mut params: BootParams) -> Result<()> {
        params.validate()?;
        params.version = 0;
        let mut state = self.state.write().await;
        for xname in xnames {
            state.v1.insert(xname.clone(), params.clone());
        }
        info!("Stored legacy boot parameters for {} hosts", xnames.len());
        Ok(())
    }

    async fn get_v1(&self, xname: &str) -> Result<BootParams> {
        let state = self.state.read().await;
        state
            .v1
            .get(xname)
            .cloned()
            .ok_or_else(|| BootParamsError::NotFound(xname.to_string()))
    }

    async fn delete_v1(&self, xname: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .v1
            .remove(xname)
            .map(|_| info!("Deleted legacy boot parameters for {}", xname))
            .ok_or_else(|| BootParamsError::NotFound(xname.to_string()))
    }

    async fn assign_template_to_group(&self, id: &str, group: &str, version: u32) -> Result<u32> {
        let mut state = self.state.write().await;
        let resolved = history(&state, id)?.resolve(id, version)?;
        state.groups.insert(
            group.to_string(),
            GroupBinding {
                group: group.to_string(),
                id: id.to_string(),
                version: resolved,
            },
        );
        info!("Bound group {} to {} version {}", group, id, resolved);
        Ok(resolved)
    }

    async fn get_template_for_group(&self, group: &str) -> Result<BootParams> {
        debug!("Resolving template for group {}", group);
        let state = self.state.read().await;
        let binding = state
            .groups
            .get(group)
            .ok_or_else(|| BootParamsError::NotFound(group.to_string()))?;
        history(&state, &binding.id)?.version(&binding.id, binding.version)
    }

    async fn get_group_binding(&self, group: &str) -> Result<GroupBinding> {
        let state = self.state.read().await;
        state
            .groups
            .get(group)
            .cloned()
            .ok_or_else(|| BootParamsError::NotFound(group.to_string()))
    }

    async fn unassign_group(&self, group: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .groups
            .remove(group)
            .map(|_| info!("Removed template binding for group {}", group))
            .ok_or_else(|| BootParamsError::NotFound(group.to_string()))
    }
}
