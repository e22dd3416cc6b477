//! Boot Parameters
//!
//! Versioned storage of per-node and per-template boot configuration, and
//! rendering of that configuration into iPXE boot scripts.
//!
//! This crate provides:
//! - `BootParams` and its optional root filesystem / cloud-init descriptors
//! - Validation and merging of boot parameter fragments
//! - The `BootParamsStore` contract with an in-memory backend and a
//!   SQLite-backed backend (feature `sqlite`, on by default)
//! - Group template bindings that pin a group to one historical version
//! - A pure boot script generator
//!
//! # Example
//!
//! ```no_run
//! use bootparams::{BootParams, BootParamsStore, MemoryStore, generate_boot_script};
//!
//! # async fn example() -> Result<(), bootparams::BootParamsError> {
//! let store = MemoryStore::new();
//! store.set("x3000c0s1b0n0", BootParams::new("http://images/vmlinuz", "http://images/initrd")).await?;
//!
//! let params = store.get_default("x3000c0s1b0n0").await?;
//! let script = generate_boot_script(&params, 0, "x86_64")?;
//! assert!(script.starts_with("#!ipxe"));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod model;
pub mod script;
pub mod store;
pub mod versioned;

pub use error::{BootParamsError, ErrorKind, Result};
pub use model::{BootParams, CloudInit, RootFs, RootFsType, merge};
pub use script::{RETRY_CHAIN_URL, generate_boot_script};
pub use store::{BootParamsStore, MemoryStore};
#[cfg(feature = "sqlite")]
pub use store::SqliteStore;
pub use versioned::{GroupBinding, VersionedBootParams};
