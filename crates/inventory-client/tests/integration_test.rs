//! Integration tests for the inventory client
//!
//! These tests require a running inventory service.
//! Set INVENTORY_URL (and optionally INVENTORY_TOKEN, INVENTORY_TEST_MAC,
//! INVENTORY_TEST_IP) environment variables to run.

use inventory_client::{InventoryClient, InventoryClientTrait};

fn client() -> InventoryClient {
    let url = std::env::var("INVENTORY_URL")
        .unwrap_or_else(|_| "http://localhost:27779".to_string());
    let token = std::env::var("INVENTORY_TOKEN").ok();
    InventoryClient::new(url, token).expect("Failed to create client")
}

#[tokio::test]
#[ignore] // Requires running inventory service
async fn test_resolve_mac() {
    let mac = std::env::var("INVENTORY_TEST_MAC")
        .expect("INVENTORY_TEST_MAC environment variable must be set");

    let id = client().resolve_mac(&mac).await.expect("Failed to resolve MAC");

    println!("MAC {} resolved to {:?}", mac, id);
}

#[tokio::test]
#[ignore] // Requires running inventory service
async fn test_resolve_address_and_groups() {
    let ip = std::env::var("INVENTORY_TEST_IP")
        .expect("INVENTORY_TEST_IP environment variable must be set");

    let node = client()
        .resolve_address(ip.parse().expect("INVENTORY_TEST_IP must be an IP address"))
        .await
        .expect("Failed to resolve address");

    if let Some(node) = node {
        println!("{} is {} in groups {:?}", ip, node.id, node.groups);
    } else {
        println!("{} is not known to the inventory", ip);
    }
}

#[tokio::test]
#[ignore] // Requires running inventory service
async fn test_unknown_node_has_no_groups() {
    let groups = client()
        .groups_for("x9999c9s9b9n9")
        .await
        .expect("Failed to query memberships");

    assert!(groups.is_empty());
}
