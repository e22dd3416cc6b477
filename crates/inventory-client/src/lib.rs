//! Inventory Client
//!
//! Resolves the identity of booting machines against a hardware state
//! manager style inventory service.
//!
//! # Example
//!
//! ```no_run
//! use inventory_client::{InventoryClient, InventoryClientTrait};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = InventoryClient::new("http://hsm:27779".to_string(), None)?;
//!
//! // Which node is booting from this address, and which groups is it in?
//! if let Some(node) = client.resolve_address("10.252.1.9".parse()?).await? {
//!     println!("{} in groups {:?}", node.id, node.groups);
//! }
//!
//! // Legacy provisioning requests identify hosts by MAC.
//! let id = client.resolve_mac("a4:bf:01:3e:c8:0b").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Address resolution**: client IP to node identifier plus groups
//! - **MAC resolution**: normalized MAC to node identifier
//! - **Static inventory**: in-memory implementation for tests and
//!   deployments without an inventory service

pub mod client;
pub mod error;
pub mod models;
pub mod static_client;
#[path = "trait.rs"]
pub mod inventory_trait;

pub use client::InventoryClient;
pub use error::InventoryError;
pub use models::*;
pub use inventory_trait::InventoryClientTrait;
pub use static_client::StaticInventoryClient;
