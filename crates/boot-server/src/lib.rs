//! Boot Server
//!
//! HTTP front end for the versioned boot parameter store, built on `axum`.
//!
//! This server provides:
//! - Boot parameter API (create, update, read, history, default version)
//! - Group template bindings
//! - iPXE boot script endpoint consumed by network-boot firmware
//! - Legacy single-version bulk provisioning endpoint
//!
//! The store backend (in-memory or SQLite) and the inventory service used
//! to identify booting nodes are selected by configuration.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod legacy;
pub mod server;

#[cfg(test)]
mod http_test;

pub use config::{ServerConfig, StoreBackend};
pub use error::{ApiError, ServerError};
pub use server::*;
