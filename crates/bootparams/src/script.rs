//! iPXE boot script generation.
//!
//! Renders resolved boot parameters into the script text fetched by
//! network-boot firmware. Line order and spacing are parsed by the
//! firmware, so the output must stay byte-stable for identical inputs.

use crate::error::{BootParamsError, Result};
use crate::model::{BootParams, CloudInit, RootFs, RootFsType};

/// Endpoint the script chains back to after a failed boot.
pub const RETRY_CHAIN_URL: &str = "https://api-gw-service-nmn.local/apis/bss/boot/v1/bootscript";

const RETRY_LABEL: &str = "boot_retry";
const RETRY_SLEEP_SECONDS: u32 = 30;

/// Generates the boot script for `params`.
///
/// `retry` and `arch` only feed the chain-retry query string. Fails with
/// `Validation` when no kernel is set; the initrd line is optional here
/// because merged or externally sourced parameters reach this point
/// without passing through a store.
pub fn generate_boot_script(params: &BootParams, retry: u32, arch: &str) -> Result<String> {
    if params.kernel.is_empty() {
        return Err(BootParamsError::Validation(
            "cannot generate boot script without a kernel".to_string(),
        ));
    }

    let fallback = format!("|| goto {RETRY_LABEL}");
    let mut lines = vec!["#!ipxe".to_string(), format!("{} {fallback}", kernel_line(params))];
    if !params.initrd.is_empty() {
        lines.push(format!("initrd --name initrd {} {fallback}", params.initrd));
    }
    lines.push(format!("boot {fallback}"));
    lines.push(format!(":{RETRY_LABEL}"));
    lines.push(format!("sleep {RETRY_SLEEP_SECONDS}"));
    lines.push(format!("chain {RETRY_CHAIN_URL}?{}", retry_query(retry, arch)));

    let mut script = lines.join("\n");
    script.push('\n');
    Ok(script)
}

fn kernel_line(params: &BootParams) -> String {
    let mut parts = vec![format!("kernel --name kernel {}", params.kernel)];
    if let Some(root_fs) = &params.root_fs {
        parts.extend(root_fs_flags(root_fs));
    }
    if let Some(flag) = params.cloud_init.as_ref().and_then(cloud_init_flag) {
        parts.push(flag);
    }
    if !params.params.is_empty() {
        parts.push(params.params.clone());
    }
    parts.join(" ")
}

fn root_fs_flags(root_fs: &RootFs) -> Vec<String> {
    let mut flags = Vec::new();
    match root_fs.fs_type {
        RootFsType::Nfs => {
            flags.push("rd.neednet=1".to_string());
            if !root_fs.server.is_empty() && !root_fs.path.is_empty() {
                flags.push(format!("root=nfs://{}:{}", root_fs.server, root_fs.path));
                if !root_fs.options.is_empty() {
                    flags.push(format!("rootflags={}", root_fs.options));
                }
            }
        }
        RootFsType::Local => {
            if !root_fs.path.is_empty() {
                flags.push(format!("root={}", root_fs.path));
                if !root_fs.options.is_empty() {
                    flags.push(format!("rootflags={}", root_fs.options));
                }
            }
        }
    }
    flags
}

fn cloud_init_flag(cloud_init: &CloudInit) -> Option<String> {
    if cloud_init.url.is_empty() {
        return None;
    }
    let mut flag = format!("ds=nocloud-net;s={}", cloud_init.url);
    if !cloud_init.version.is_empty() {
        flag.push_str(";v=");
        flag.push_str(&cloud_init.version);
    }
    Some(flag)
}

fn retry_query(retry: u32, arch: &str) -> String {
    let mut query = Vec::new();
    if retry > 0 {
        query.push(format!("retry={retry}"));
    }
    if !arch.is_empty() {
        query.push(format!("arch={arch}"));
    }
    query.join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kernel_line_of(script: &str) -> &str {
        script.lines().nth(1).unwrap()
    }

    #[test]
    fn test_minimal_script_layout() {
        let script = generate_boot_script(&BootParams::new("K", "I"), 0, "").unwrap();
        let expected = "#!ipxe\n\
            kernel --name kernel K || goto boot_retry\n\
            initrd --name initrd I || goto boot_retry\n\
            boot || goto boot_retry\n\
            :boot_retry\n\
            sleep 30\n\
            chain https://api-gw-service-nmn.local/apis/bss/boot/v1/bootscript?\n";
        assert_eq!(script, expected);
    }

    #[test]
    fn test_nfs_root_flags() {
        let params = BootParams::new("K", "I")
            .with_root_fs(RootFs::nfs("10.0.0.1", "/nfsroot").with_options("vers=4,ro"));
        let script = generate_boot_script(&params, 0, "").unwrap();
        assert!(
            kernel_line_of(&script)
                .contains("rd.neednet=1 root=nfs://10.0.0.1:/nfsroot rootflags=vers=4,ro")
        );
    }

    #[test]
    fn test_nfs_without_server_only_needs_net() {
        let params = BootParams::new("K", "I")
            .with_root_fs(RootFs::nfs("", "/nfsroot").with_options("ro"));
        let script = generate_boot_script(&params, 0, "").unwrap();
        assert_eq!(
            kernel_line_of(&script),
            "kernel --name kernel K rd.neednet=1 || goto boot_retry"
        );
    }

    #[test]
    fn test_local_root_flags() {
        let params = BootParams::new("K", "I").with_root_fs(RootFs::local("/dev/sda1").with_options("rw"));
        let script = generate_boot_script(&params, 0, "").unwrap();
        assert_eq!(
            kernel_line_of(&script),
            "kernel --name kernel K root=/dev/sda1 rootflags=rw || goto boot_retry"
        );

        let params = BootParams::new("K", "I").with_root_fs(RootFs::local("").with_options("rw"));
        let script = generate_boot_script(&params, 0, "").unwrap();
        assert_eq!(kernel_line_of(&script), "kernel --name kernel K || goto boot_retry");
    }

    #[test]
    fn test_cloud_init_and_params_order() {
        let params = BootParams::new("K", "I")
            .with_root_fs(RootFs::local("/dev/sda1"))
            .with_cloud_init(CloudInit { url: "http://10.1.1.1:8888/".into(), version: "2".into() })
            .with_params("console=ttyS0,115200 quiet");
        let script = generate_boot_script(&params, 0, "").unwrap();
        assert_eq!(
            kernel_line_of(&script),
            "kernel --name kernel K root=/dev/sda1 ds=nocloud-net;s=http://10.1.1.1:8888/;v=2 \
             console=ttyS0,115200 quiet || goto boot_retry"
        );
    }

    #[test]
    fn test_cloud_init_without_url_is_skipped() {
        let params = BootParams::new("K", "I")
            .with_cloud_init(CloudInit { url: String::new(), version: "2".into() });
        let script = generate_boot_script(&params, 0, "").unwrap();
        assert!(!script.contains("nocloud"));
    }

    #[test]
    fn test_retry_query_combinations() {
        let params = BootParams::new("K", "I");
        let last = |retry, arch| {
            generate_boot_script(&params, retry, arch)
                .unwrap()
                .lines()
                .last()
                .unwrap()
                .to_string()
        };
        assert_eq!(last(2, "x86_64"), format!("chain {RETRY_CHAIN_URL}?retry=2&arch=x86_64"));
        assert_eq!(last(1, ""), format!("chain {RETRY_CHAIN_URL}?retry=1"));
        assert_eq!(last(0, "arm64"), format!("chain {RETRY_CHAIN_URL}?arch=arm64"));
        assert_eq!(last(0, ""), format!("chain {RETRY_CHAIN_URL}?"));
    }

    #[test]
    fn test_missing_kernel_rejected() {
        let params = BootParams::new("", "I");
        assert!(matches!(
            generate_boot_script(&params, 0, ""),
            Err(BootParamsError::Validation(_))
        ));
    }

    #[test]
    fn test_missing_initrd_skips_line() {
        let params = BootParams::new("K", "");
        let script = generate_boot_script(&params, 0, "").unwrap();
        assert!(!script.contains("initrd"));
        assert_eq!(script.lines().nth(2), Some("boot || goto boot_retry"));
    }

    #[test]
    fn test_deterministic_and_ordered() {
        let params = BootParams::new("K", "I").with_params("a=b");
        let first = generate_boot_script(&params, 3, "x86_64").unwrap();
        let second = generate_boot_script(&params, 3, "x86_64").unwrap();
        assert_eq!(first, second);

        let position = |needle: &str| first.find(needle).unwrap();
        assert!(position("kernel --name") < position("initrd --name"));
        assert!(position("initrd --name") < position("boot ||"));
        assert!(position("boot ||") < position(":boot_retry"));
    }
}
