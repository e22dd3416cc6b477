//! Legacy single-version provisioning
//!
//! `/bootparameters` writes one unversioned record per hardware name.
//! These records live beside the versioned histories and are never
//! reconciled with them.

use crate::api::parse_body;
use crate::error::ApiError;
use crate::server::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bootparams::BootParams;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Header carrying the per-request referral token
pub const REFERRAL_TOKEN_HEADER: &str = "BSS-Referral-Token";

/// Body of `PUT|POST /bootparameters`
#[derive(Debug, Deserialize)]
pub struct LegacyBootParamsRequest {
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub macs: Vec<String>,
    #[serde(default)]
    pub nids: Vec<u64>,
    #[serde(flatten)]
    pub params: BootParams,
}

/// Response of `PUT|POST /bootparameters`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyBootParamsResponse {
    pub hosts: Vec<String>,
    pub failed_macs: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: Option<String>,
}

fn require_name(name: Option<String>) -> Result<String, ApiError> {
    name.filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing required query parameter 'name'".to_string()))
}

/// `PUT|POST /bootparameters`
pub async fn put_v1(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request: LegacyBootParamsRequest = parse_body(&body)?;

    if !request.nids.is_empty() {
        return Err(ApiError::BadRequest(
            "NIDs are not supported; identify nodes by hosts or macs".to_string(),
        ));
    }
    if request.hosts.is_empty() && request.macs.is_empty() {
        return Err(ApiError::BadRequest(
            "at least one host or MAC is required".to_string(),
        ));
    }
    request.params.validate()?;

    let mut hosts: Vec<String> = Vec::new();
    for host in request.hosts {
        if !hosts.contains(&host) {
            hosts.push(host);
        }
    }

    let mut failed_macs = Vec::new();
    for mac in request.macs {
        match state.inventory.resolve_mac(&mac).await {
            Ok(Some(id)) => {
                if !hosts.contains(&id) {
                    hosts.push(id);
                }
            }
            Ok(None) => {
                warn!("MAC {} is not known to the inventory", mac);
                failed_macs.push(mac);
            }
            Err(e) => {
                warn!("Failed to resolve MAC {}: {}", mac, e);
                failed_macs.push(mac);
            }
        }
    }

    if hosts.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "no hosts could be resolved (failed MACs: {})",
            failed_macs.join(", ")
        )));
    }

    state.store.set_v1_many(&hosts, request.params).await?;

    let token = Uuid::new_v4().to_string();
    info!(
        "Stored legacy boot parameters for {} hosts ({} MACs failed)",
        hosts.len(),
        failed_macs.len()
    );

    Ok((
        StatusCode::CREATED,
        [(REFERRAL_TOKEN_HEADER, token)],
        Json(LegacyBootParamsResponse { hosts, failed_macs }),
    )
        .into_response())
}

/// `GET /bootparameters?name=`
pub async fn get_v1(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> Result<Json<BootParams>, ApiError> {
    let name = require_name(query.name)?;
    Ok(Json(state.store.get_v1(&name).await?))
}

/// `DELETE /bootparameters?name=`
pub async fn delete_v1(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> Result<StatusCode, ApiError> {
    let name = require_name(query.name)?;
    state.store.delete_v1(&name).await?;
    info!("Deleted legacy boot parameters for {}", name);
    Ok(StatusCode::NO_CONTENT)
}
