//! Boot parameter model
//!
//! Defines one concrete boot configuration (kernel, initrd, cmdline,
//! root filesystem, cloud-init datasource) plus validation and merging.

use crate::error::{BootParamsError, Result};
use serde::{Deserialize, Serialize};

/// One concrete set of boot configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootParams {
    /// Assigned by the store; ignored on input
    #[serde(default)]
    pub version: u32,

    /// Kernel image URL or path
    #[serde(default)]
    pub kernel: String,

    /// Initrd image URL or path
    #[serde(default)]
    pub initrd: String,

    /// Kernel command-line fragment, passed through verbatim
    #[serde(default)]
    pub params: String,

    /// Root filesystem descriptor
    #[serde(default, rename = "rootfs", skip_serializing_if = "Option::is_none")]
    pub root_fs: Option<RootFs>,

    /// Cloud-init datasource descriptor
    #[serde(default, rename = "cloud-init", skip_serializing_if = "Option::is_none")]
    pub cloud_init: Option<CloudInit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootFsType {
    /// Network root over NFS
    Nfs,
    /// Local block device
    Local,
}

/// Root filesystem descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootFs {
    #[serde(rename = "type")]
    pub fs_type: RootFsType,

    /// NFS server address (ignored for local roots)
    #[serde(default)]
    pub server: String,

    /// Export path or device path
    #[serde(default)]
    pub path: String,

    /// Mount options, emitted as `rootflags=`
    #[serde(default)]
    pub options: String,
}

/// Cloud-init nocloud-net datasource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudInit {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub version: String,
}

impl BootParams {
    /// Creates boot parameters with only kernel and initrd set.
    pub fn new(kernel: impl Into<String>, initrd: impl Into<String>) -> Self {
        Self {
            kernel: kernel.into(),
            initrd: initrd.into(),
            ..Default::default()
        }
    }

    /// Sets the kernel command-line fragment.
    #[must_use]
    pub fn with_params(mut self, params: impl Into<String>) -> Self {
        self.params = params.into();
        self
    }

    /// Sets the root filesystem descriptor.
    #[must_use]
    pub fn with_root_fs(mut self, root_fs: RootFs) -> Self {
        self.root_fs = Some(root_fs);
        self
    }

    /// Sets the cloud-init datasource.
    #[must_use]
    pub fn with_cloud_init(mut self, cloud_init: CloudInit) -> Self {
        self.cloud_init = Some(cloud_init);
        self
    }

    /// Checks that both kernel and initrd are present.
    ///
    /// Every record persisted by a store passes this check. Partial
    /// fragments that are only used as `merge` input may not.
    pub fn validate(&self) -> Result<()> {
        if self.kernel.is_empty() {
            return Err(BootParamsError::Validation("kernel is required".to_string()));
        }
        if self.initrd.is_empty() {
            return Err(BootParamsError::Validation("initrd is required".to_string()));
        }
        Ok(())
    }
}

impl RootFs {
    /// NFS root served from `server:path`.
    pub fn nfs(server: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            fs_type: RootFsType::Nfs,
            server: server.into(),
            path: path.into(),
            options: String::new(),
        }
    }

    /// Local root on the given device path.
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            fs_type: RootFsType::Local,
            server: String::new(),
            path: path.into(),
            options: String::new(),
        }
    }

    /// Sets the mount options.
    #[must_use]
    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = options.into();
        self
    }
}

/// Composes ordered fragments into one set of boot parameters.
///
/// Kernel, initrd, rootfs and cloud-init are first-wins; `params` is the
/// space-joined concatenation of every non-empty fragment value. The result
/// is not validated and carries version 0.
#[must_use]
pub fn merge(fragments: &[BootParams]) -> BootParams {
    let mut merged = BootParams::default();
    let mut cmdline: Vec<&str> = Vec::new();

    for fragment in fragments {
        if merged.kernel.is_empty() && !fragment.kernel.is_empty() {
            merged.kernel.clone_from(&fragment.kernel);
        }
        if merged.initrd.is_empty() && !fragment.initrd.is_empty() {
            merged.initrd.clone_from(&fragment.initrd);
        }
        if !fragment.params.is_empty() {
            cmdline.push(&fragment.params);
        }
        if merged.root_fs.is_none() {
            merged.root_fs.clone_from(&fragment.root_fs);
        }
        if merged.cloud_init.is_none() {
            merged.cloud_init.clone_from(&fragment.cloud_init);
        }
    }

    merged.params = cmdline.join(" ");
    merged
}
