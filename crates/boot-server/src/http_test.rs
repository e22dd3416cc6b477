//! Tests for the boot script and legacy provisioning endpoints

use crate::api_test::{send, test_app};
use crate::legacy::{LegacyBootParamsResponse, REFERRAL_TOKEN_HEADER};
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode, header};
use bootparams::{BootParams, BootParamsStore};
use serde_json::json;
use std::net::SocketAddr;
use tower::ServiceExt;

fn node_params() -> BootParams {
    BootParams::new("http://images/vmlinuz", "http://images/initrd").with_params("console=ttyS0")
}

#[tokio::test]
async fn test_bootscript_by_id() {
    let (app, store, _) = test_app();
    store.set("n1", node_params()).await.unwrap();

    let request = Request::builder()
        .uri("/bootscript?id=n1&retry=2&arch=x86_64")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");

    let (_, script) = send(&app, "GET", "/bootscript?id=n1&retry=2&arch=x86_64", None).await;
    assert_eq!(
        script,
        "#!ipxe\n\
         kernel --name kernel http://images/vmlinuz console=ttyS0 || goto boot_retry\n\
         initrd --name initrd http://images/initrd || goto boot_retry\n\
         boot || goto boot_retry\n\
         :boot_retry\n\
         sleep 30\n\
         chain https://api-gw-service-nmn.local/apis/bss/boot/v1/bootscript?retry=2&arch=x86_64\n"
    );
}

#[tokio::test]
async fn test_bootscript_uses_default_version() {
    let (app, store, _) = test_app();
    store.set("n1", node_params()).await.unwrap();
    store
        .update("n1", BootParams::new("http://images/vmlinuz-next", "http://images/initrd"))
        .await
        .unwrap();

    let (_, script) = send(&app, "GET", "/bootscript?id=n1", None).await;
    assert!(script.contains("kernel --name kernel http://images/vmlinuz console=ttyS0"));
    assert!(script.ends_with("bootscript?\n"));

    store.set_default("n1", 2).await.unwrap();
    let (_, script) = send(&app, "GET", "/bootscript?id=n1", None).await;
    assert!(script.contains("http://images/vmlinuz-next"));
}

#[tokio::test]
async fn test_bootscript_errors() {
    let (app, store, _) = test_app();
    store.set("n1", node_params()).await.unwrap();

    let (status, _) = send(&app, "GET", "/bootscript?id=ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "GET", "/bootscript?id=n1&retry=-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("retry"));

    // No id and no client address to fall back on.
    let (status, _) = send(&app, "GET", "/bootscript", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bootscript_resolves_client_address() {
    let (app, store, inventory) = test_app();
    let addr: SocketAddr = "10.252.1.9:40000".parse().unwrap();
    inventory.add_address(addr.ip(), "n1");
    store.set("n1", node_params()).await.unwrap();

    let mut request = Request::builder().uri("/bootscript").body(Body::empty()).unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut request = Request::builder().uri("/bootscript").body(Body::empty()).unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo("10.252.1.10:40000".parse::<SocketAddr>().unwrap()));
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bootscript_resolves_mac() {
    let (app, store, inventory) = test_app();
    inventory.add_mac("A4-BF-01-3E-C8-0B", "n1").unwrap();
    store.set("n1", node_params()).await.unwrap();

    let (status, _) = send(&app, "GET", "/bootscript?mac=a4:bf:01:3e:c8:0b", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/bootscript?mac=a4:bf:01:3e:c8:0c", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bootscript_merges_group_templates() {
    let (app, store, inventory) = test_app();
    store
        .set(
            "compute",
            BootParams::new("http://images/compute-vmlinuz", "http://images/compute-initrd")
                .with_params("quiet"),
        )
        .await
        .unwrap();
    store.assign_template_to_group("compute", "rack1", 0).await.unwrap();
    inventory.set_groups("n1", vec!["unbound".to_string(), "rack1".to_string()]);

    // Group template alone
    let (status, script) = send(&app, "GET", "/bootscript?id=n1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(script.contains("kernel --name kernel http://images/compute-vmlinuz quiet ||"));

    // Node parameters take priority, their params come first
    store.set("n1", node_params()).await.unwrap();
    let (_, script) = send(&app, "GET", "/bootscript?id=n1", None).await;
    assert!(script.contains("kernel --name kernel http://images/vmlinuz console=ttyS0 quiet ||"));
}

#[tokio::test]
async fn test_bootscript_falls_back_to_legacy_record() {
    let (app, store, _) = test_app();
    store
        .set_v1("x3000c0s1b0n0", BootParams::new("http://images/legacy", "http://images/initrd"))
        .await
        .unwrap();

    let (status, script) = send(&app, "GET", "/bootscript?id=x3000c0s1b0n0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(script.contains("http://images/legacy"));
}

#[tokio::test]
async fn test_legacy_put_resolves_hosts_and_macs() {
    let (app, store, inventory) = test_app();
    inventory.add_mac("a4:bf:01:3e:c8:0b", "x3000c0s2b0n0").unwrap();

    let body = json!({
        "hosts": ["x3000c0s1b0n0", "x3000c0s1b0n0"],
        "macs": ["A4:BF:01:3E:C8:0B", "00:00:00:00:00:01"],
        "kernel": "http://images/vmlinuz",
        "initrd": "http://images/initrd",
        "params": "console=ttyS0",
        "version": 7,
    });
    let request = Request::builder()
        .method("PUT")
        .uri("/bootparameters")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let token = response.headers()[REFERRAL_TOKEN_HEADER].to_str().unwrap().to_string();
    assert_eq!(token.len(), 36);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let result: LegacyBootParamsResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(result.hosts, vec!["x3000c0s1b0n0", "x3000c0s2b0n0"]);
    assert_eq!(result.failed_macs, vec!["00:00:00:00:00:01"]);

    let stored = store.get_v1("x3000c0s2b0n0").await.unwrap();
    assert_eq!(stored.params, "console=ttyS0");
    assert_eq!(stored.version, 0);
    assert_eq!(store.get_v1("x3000c0s1b0n0").await.unwrap(), stored);
    // Legacy writes never create versioned histories.
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_legacy_put_rejections() {
    let (app, _, _) = test_app();
    let params = |extra: serde_json::Value| {
        let mut body = json!({"kernel": "http://k", "initrd": "http://i"});
        if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            body.extend(extra.clone());
        }
        body
    };

    let (status, body) = send(&app, "POST", "/bootparameters", Some(params(json!({"nids": [1, 2]})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("NIDs"));

    let (status, _) = send(&app, "POST", "/bootparameters", Some(params(json!({})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/bootparameters",
        Some(params(json!({"macs": ["00:00:00:00:00:01"]}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/bootparameters",
        Some(json!({"hosts": ["n1"], "initrd": "http://i"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_legacy_get_and_delete() {
    let (app, store, _) = test_app();
    store.set_v1("n1", node_params()).await.unwrap();

    let (status, body) = send(&app, "GET", "/bootparameters?name=n1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<BootParams>(&body).unwrap().kernel, "http://images/vmlinuz");

    let (status, _) = send(&app, "DELETE", "/bootparameters?name=n1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", "/bootparameters?name=n1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", "/bootparameters", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
