//! Boot parameter errors

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, BootParamsError>;

/// Errors returned by the store backends and the script generator
#[derive(Debug, Error)]
pub enum BootParamsError {
    /// Identifier, legacy record or group binding is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Create was attempted on an identifier that already has a history
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Version number outside `[1, len(versions)]`
    #[error("Invalid version {version} for {id}")]
    InvalidVersion { id: String, version: u32 },

    /// Missing kernel/initrd, malformed input or unsupported field
    #[error("Validation error: {0}")]
    Validation(String),

    /// SQLite backend failure
    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON (de)serialization of stored records failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other storage failure (corrupt rows, out-of-range columns)
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Coarse error classification used to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidVersion,
    Validation,
    Backend,
}

impl BootParamsError {
    /// Classify this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::InvalidVersion { .. } => ErrorKind::InvalidVersion,
            Self::Validation(_) => ErrorKind::Validation,
            #[cfg(feature = "sqlite")]
            Self::Database(_) => ErrorKind::Backend,
            Self::Serialization(_) | Self::Backend(_) => ErrorKind::Backend,
        }
    }

    /// Returns true for `NotFound`
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
