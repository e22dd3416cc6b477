//! Boot server errors

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bootparams::{BootParamsError, ErrorKind};
use inventory_client::InventoryError;
use thiserror::Error;
use tracing::error;

/// Errors returned from request handlers
///
/// The response body is the error message as plain text.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Store or generator failure
    #[error(transparent)]
    BootParams(#[from] BootParamsError),

    /// Inventory lookup failure
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Malformed query parameter or body
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Nothing to serve for the request
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ApiError {
    /// Status code for this error
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BootParams(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::AlreadyExists | ErrorKind::InvalidVersion | ErrorKind::Validation => {
                    StatusCode::BAD_REQUEST
                }
                ErrorKind::Backend => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Inventory(InventoryError::InvalidRequest(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Inventory(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}

/// Errors that prevent the server from starting
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Store error: {0}")]
    Store(#[from] BootParamsError),

    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
