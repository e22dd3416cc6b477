//! Inventory API client
//!
//! Implements lookups against the hardware state manager REST API:
//! `/hsm/v2/Inventory/EthernetInterfaces` and `/hsm/v2/memberships/{id}`.

use crate::error::InventoryError;
use crate::inventory_trait::InventoryClientTrait;
use crate::models::{EthernetInterface, Membership, NodeIdentity, normalize_mac};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, warn};

/// Inventory API client
#[derive(Debug, Clone)]
pub struct InventoryClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl InventoryClient {
    /// Create a new inventory client
    ///
    /// # Arguments
    /// * `base_url` - Inventory base URL (e.g., "http://hsm:27779")
    /// * `token` - Optional bearer token for authentication
    pub fn new(base_url: String, token: Option<String>) -> Result<Self, InventoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(InventoryError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` with query parameters. A 404 maps to `None`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, InventoryError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);

        let mut request = self
            .client
            .get(&url)
            .query(query)
            .header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InventoryError::Api(format!(
                "GET {} failed: {} - {}",
                path, status, body
            )));
        }

        let text = response.text().await?;
        let parsed = serde_json::from_str(&text).map_err(|e| {
            warn!(
                "Undecodable inventory response from {}: {} (first 200 chars: {})",
                path,
                e,
                text.chars().take(200).collect::<String>()
            );
            InventoryError::Serialization(e)
        })?;
        Ok(Some(parsed))
    }

    /// Query ethernet interfaces by one filter
    pub async fn query_ethernet_interfaces(
        &self,
        filter: (&str, &str),
    ) -> Result<Vec<EthernetInterface>, InventoryError> {
        Ok(self
            .get_json("/hsm/v2/Inventory/EthernetInterfaces", &[filter])
            .await?
            .unwrap_or_default())
    }

    /// Get the memberships of one component
    pub async fn get_membership(&self, id: &str) -> Result<Option<Membership>, InventoryError> {
        let path = format!("/hsm/v2/memberships/{}", urlencoding::encode(id));
        self.get_json(&path, &[]).await
    }
}

fn first_component(interfaces: Vec<EthernetInterface>) -> Option<String> {
    interfaces
        .into_iter()
        .map(|iface| iface.component_id)
        .find(|id| !id.is_empty())
}

#[async_trait::async_trait]
impl InventoryClientTrait for InventoryClient {
    async fn resolve_address(&self, addr: IpAddr) -> Result<Option<NodeIdentity>, InventoryError> {
        debug!("Resolving node by address {}", addr);
        let ip = addr.to_string();
        let interfaces = self.query_ethernet_interfaces(("IPAddress", ip.as_str())).await?;
        let Some(id) = first_component(interfaces) else {
            return Ok(None);
        };
        let groups = self.groups_for(&id).await?;
        Ok(Some(NodeIdentity { id, groups }))
    }

    async fn resolve_mac(&self, mac: &str) -> Result<Option<String>, InventoryError> {
        let mac = normalize_mac(mac)?;
        debug!("Resolving node by MAC {}", mac);
        let interfaces = self.query_ethernet_interfaces(("MACAddress", mac.as_str())).await?;
        Ok(first_component(interfaces))
    }

    async fn groups_for(&self, id: &str) -> Result<Vec<String>, InventoryError> {
        Ok(self
            .get_membership(id)
            .await?
            .map(|membership| membership.group_labels)
            .unwrap_or_default())
    }
}
