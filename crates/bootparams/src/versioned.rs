//! Version history and group bindings
//!
//! Both store backends drive every state transition through
//! `VersionedBootParams`, so their observable behavior is identical.

use crate::error::{BootParamsError, Result};
use crate::model::BootParams;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only history of boot parameters under one identifier.
///
/// `versions[i]` holds version `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedBootParams {
    pub versions: Vec<BootParams>,
    pub current_version: u32,
    pub default_version: u32,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot binding from a group to one concrete template version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBinding {
    pub group: String,
    pub id: String,
    pub version: u32,
}

impl VersionedBootParams {
    /// Starts a history at version 1, which is both current and default.
    pub fn new(mut params: BootParams) -> Self {
        params.version = 1;
        Self {
            versions: vec![params],
            current_version: 1,
            default_version: 1,
            updated_at: Utc::now(),
        }
    }

    /// Number of stored versions.
    #[must_use]
    pub fn len(&self) -> u32 {
        u32::try_from(self.versions.len()).unwrap_or(u32::MAX)
    }

    /// True when no version has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Copy of version `version`.
    pub fn version(&self, id: &str, version: u32) -> Result<BootParams> {
        let index = self.index_of(id, version)?;
        Ok(self.versions[index].clone())
    }

    /// Copy of the current version.
    pub fn current(&self, id: &str) -> Result<BootParams> {
        if self.is_empty() {
            return Err(BootParamsError::NotFound(id.to_string()));
        }
        self.version(id, self.current_version)
    }

    /// Copy of the default version.
    pub fn default_params(&self, id: &str) -> Result<BootParams> {
        if self.is_empty() {
            return Err(BootParamsError::NotFound(id.to_string()));
        }
        self.version(id, self.default_version)
    }

    /// Appends a new version and makes it current. Returns the stored copy.
    pub fn append(&mut self, mut params: BootParams) -> BootParams {
        let version = self.len().saturating_add(1);
        params.version = version;
        self.versions.push(params.clone());
        self.current_version = version;
        self.updated_at = Utc::now();
        params
    }

    /// Points the default at an existing version. State is untouched on error.
    pub fn set_default(&mut self, id: &str, version: u32) -> Result<()> {
        self.index_of(id, version)?;
        self.default_version = version;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Resolves a requested version to a concrete one; 0 means the current default.
    pub fn resolve(&self, id: &str, version: u32) -> Result<u32> {
        let resolved = if version == 0 { self.default_version } else { version };
        self.index_of(id, resolved)?;
        Ok(resolved)
    }

    // 1-based version number to storage index
    fn index_of(&self, id: &str, version: u32) -> Result<usize> {
        if version == 0 || version > self.len() {
            return Err(BootParamsError::InvalidVersion {
                id: id.to_string(),
                version,
            });
        }
        Ok((version - 1) as usize)
    }
}
