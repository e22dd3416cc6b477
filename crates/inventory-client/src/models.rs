//! Inventory API models
//!
//! These models match the hardware state manager REST API payloads.

use crate::error::InventoryError;
use serde::{Deserialize, Serialize};

/// Resolved identity of a booting node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    /// Node identifier (xname)
    pub id: String,
    /// Group labels the node belongs to, in inventory order
    #[serde(default)]
    pub groups: Vec<String>,
}

/// Ethernet interface record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EthernetInterface {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "MACAddress", default)]
    pub mac_address: String,
    #[serde(rename = "ComponentID", default)]
    pub component_id: String,
    #[serde(rename = "IPAddresses", default)]
    pub ip_addresses: Vec<IpAddressMapping>,
}

/// IP address attached to an ethernet interface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpAddressMapping {
    #[serde(rename = "IPAddress")]
    pub ip_address: String,
    #[serde(rename = "Network", default)]
    pub network: String,
}

/// Group and partition membership of one component
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub id: String,
    #[serde(default)]
    pub group_labels: Vec<String>,
    #[serde(default)]
    pub partition_name: String,
}

/// Normalizes a MAC address to lower-case colon-separated form.
///
/// Accepts `:` or `-` separators, or twelve bare hex digits.
pub fn normalize_mac(mac: &str) -> Result<String, InventoryError> {
    let digits: String = mac
        .trim()
        .chars()
        .filter(|c| *c != ':' && *c != '-')
        .collect::<String>()
        .to_ascii_lowercase();
    if digits.len() != 12 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(InventoryError::InvalidRequest(format!("invalid MAC address: {mac}")));
    }
    let octets: Vec<&str> = (0..6).map(|i| &digits[i * 2..i * 2 + 2]).collect();
    Ok(octets.join(":"))
}
