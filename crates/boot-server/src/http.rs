//! iPXE boot script endpoint
//!
//! Firmware chains to `GET /bootscript` after DHCP. The booting node is
//! identified by query parameter or by its source address, its boot
//! parameter fragments are collected and merged, and the merged result is
//! rendered as an iPXE script.

use crate::error::ApiError;
use crate::server::AppState;
use axum::Extension;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use bootparams::{BootParams, generate_boot_script, merge};
use serde::Deserialize;
use std::net::SocketAddr;
use tracing::{debug, info, warn};

/// Query parameters of `GET /bootscript`
#[derive(Debug, Default, Deserialize)]
pub struct BootScriptQuery {
    pub id: Option<String>,
    pub mac: Option<String>,
    /// Kept as text so that a malformed value is a 400 with our message
    pub retry: Option<String>,
    pub arch: Option<String>,
}

/// `GET /bootscript`
pub async fn bootscript(
    State(state): State<AppState>,
    Query(query): Query<BootScriptQuery>,
    connect_info: Option<Extension<ConnectInfo<SocketAddr>>>,
) -> Result<Response, ApiError> {
    let retry = parse_retry(query.retry.as_deref())?;
    let arch = query.arch.unwrap_or_default();
    let peer = connect_info.map(|Extension(ConnectInfo(addr))| addr);

    let (id, groups) = identify(&state, query.id, query.mac, peer).await?;
    let fragments = collect_fragments(&state, &id, &groups).await?;
    if fragments.is_empty() {
        warn!("No boot parameters for {}", id);
        return Err(ApiError::NotFound(format!("no boot parameters for {id}")));
    }

    let script = generate_boot_script(&merge(&fragments), retry, &arch)?;
    info!(
        "Serving boot script for {} ({} fragments, retry {})",
        id,
        fragments.len(),
        retry
    );
    Ok(([(header::CONTENT_TYPE, "text/plain")], script).into_response())
}

fn parse_retry(raw: Option<&str>) -> Result<u32, ApiError> {
    match raw {
        None | Some("") => Ok(0),
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("invalid retry value '{raw}'"))),
    }
}

/// Node identifier and its group labels.
async fn identify(
    state: &AppState,
    id: Option<String>,
    mac: Option<String>,
    peer: Option<SocketAddr>,
) -> Result<(String, Vec<String>), ApiError> {
    if let Some(id) = id.filter(|id| !id.is_empty()) {
        let groups = groups_for(state, &id).await;
        return Ok((id, groups));
    }

    if let Some(mac) = mac.filter(|mac| !mac.is_empty()) {
        let id = state
            .inventory
            .resolve_mac(&mac)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("unknown MAC {mac}")))?;
        debug!("MAC {} resolved to {}", mac, id);
        let groups = groups_for(state, &id).await;
        return Ok((id, groups));
    }

    let Some(peer) = peer else {
        return Err(ApiError::BadRequest(
            "missing 'id' and no client address to resolve".to_string(),
        ));
    };
    let node = state
        .inventory
        .resolve_address(peer.ip())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("unknown client address {}", peer.ip())))?;
    debug!("Address {} resolved to {}", peer.ip(), node.id);
    Ok((node.id, node.groups))
}

/// Group lookup failures only cost the node its templates.
async fn groups_for(state: &AppState, id: &str) -> Vec<String> {
    match state.inventory.groups_for(id).await {
        Ok(groups) => groups,
        Err(e) => {
            warn!("Failed to look up groups of {}: {}", id, e);
            Vec::new()
        }
    }
}

/// Fragments in priority order: node default, group templates, legacy record.
async fn collect_fragments(
    state: &AppState,
    id: &str,
    groups: &[String],
) -> Result<Vec<BootParams>, ApiError> {
    let mut fragments = Vec::new();

    if let Some(params) = found(state.store.get_default(id).await)? {
        fragments.push(params);
    }
    for group in groups {
        if let Some(params) = found(state.store.get_template_for_group(group).await)? {
            debug!("Using template bound to group {} for {}", group, id);
            fragments.push(params);
        }
    }
    if let Some(params) = found(state.store.get_v1(id).await)? {
        fragments.push(params);
    }

    Ok(fragments)
}

fn found(result: bootparams::Result<BootParams>) -> Result<Option<BootParams>, ApiError> {
    match result {
        Ok(params) => Ok(Some(params)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_retry() {
        assert_eq!(parse_retry(None).unwrap(), 0);
        assert_eq!(parse_retry(Some("")).unwrap(), 0);
        assert_eq!(parse_retry(Some("3")).unwrap(), 3);
        assert!(matches!(parse_retry(Some("-1")), Err(ApiError::BadRequest(_))));
        assert!(matches!(parse_retry(Some("abc")), Err(ApiError::BadRequest(_))));
    }
}
