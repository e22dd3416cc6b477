//! Inventory client errors

use thiserror::Error;

/// Errors that can occur when interacting with the inventory service
#[derive(Debug, Error)]
pub enum InventoryError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Inventory API returned an error status
    #[error("Inventory API error: {0}")]
    Api(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid request (e.g., malformed MAC address)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
