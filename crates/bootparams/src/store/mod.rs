//! Boot parameter store contract
//!
//! `BootParamsStore` abstracts persistence so the HTTP layer can run on the
//! volatile in-memory backend or the SQLite backend, selected by
//! configuration. Both backends expose the same state machine and error
//! conditions and always return owned copies of stored records.

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::model::BootParams;
use crate::versioned::{GroupBinding, VersionedBootParams};

/// Trait for boot parameter persistence
///
/// Reads take the store's shared lock, writes its exclusive lock.
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait BootParamsStore: Send + Sync {
    // Versioned histories

    /// Creates `id` at version 1. Fails with `AlreadyExists` if present.
    async fn set(&self, id: &str, params: BootParams) -> Result<BootParams>;

    /// Current version of `id`.
    async fn get(&self, id: &str) -> Result<BootParams>;

    /// Version `version` of `id`, 1-based.
    async fn get_version(&self, id: &str, version: u32) -> Result<BootParams>;

    /// Default version of `id`.
    async fn get_default(&self, id: &str) -> Result<BootParams>;

    /// Whole history of `id`.
    async fn get_history(&self, id: &str) -> Result<VersionedBootParams>;

    /// Appends a version to `id` and makes it current.
    async fn update(&self, id: &str, params: BootParams) -> Result<BootParams>;

    /// Points the default of `id` at an existing version.
    async fn set_default(&self, id: &str, version: u32) -> Result<()>;

    /// Removes the history of `id` and every group binding that targets it. Idempotent.
    async fn delete(&self, id: &str) -> Result<()>;

    /// All identifiers with a history, sorted.
    async fn list(&self) -> Result<Vec<String>>;

    // Legacy single-version records

    /// Overwrites the legacy record for `xname`. Legacy records carry version 0.
    async fn set_v1(&self, xname: &str, params: BootParams) -> Result<()>;

    /// Overwrites the legacy records of every name in `xnames` as one write;
    /// on failure none of them change.
    async fn set_v1_many(&self, xnames: &[String], params: BootParams) -> Result<()>;

    /// Legacy record for `xname`.
    async fn get_v1(&self, xname: &str) -> Result<BootParams>;

    /// Removes the legacy record for `xname`.
    async fn delete_v1(&self, xname: &str) -> Result<()>;

    // Group template bindings

    /// Binds `group` to a concrete version of `id`; 0 snapshots the current default.
    /// Returns the resolved version.
    async fn assign_template_to_group(&self, id: &str, group: &str, version: u32) -> Result<u32>;

    /// Boot parameters at the version bound to `group`.
    async fn get_template_for_group(&self, group: &str) -> Result<BootParams>;

    /// The binding for `group`.
    async fn get_group_binding(&self, group: &str) -> Result<GroupBinding>;

    /// Removes the binding for `group`.
    async fn unassign_group(&self, group: &str) -> Result<()>;
}
