//! Boot parameter and group template API
//!
//! Request bodies are parsed from raw bytes so that malformed JSON is
//! reported as 400 with the parser message.

use crate::error::ApiError;
use crate::server::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use bootparams::{BootParams, GroupBinding, VersionedBootParams};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// Query parameters shared by the `/bootparams` routes
#[derive(Debug, Default, Deserialize)]
pub struct BootParamsQuery {
    pub id: Option<String>,
    /// A version number, or `default`
    pub version: Option<String>,
}

/// Body of `PUT /groups/{group}/template`
#[derive(Debug, Deserialize)]
pub struct AssignTemplateRequest {
    pub id: String,
    /// 0 binds the template's current default
    #[serde(default)]
    pub version: u32,
}

fn require_id(id: Option<String>) -> Result<String, ApiError> {
    id.filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing required query parameter 'id'".to_string()))
}

fn parse_version(raw: &str) -> Result<u32, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid version '{raw}'")))
}

pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// `POST /bootparams?id=` creates version 1.
pub async fn create_bootparams(
    State(state): State<AppState>,
    Query(query): Query<BootParamsQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<BootParams>), ApiError> {
    let id = require_id(query.id)?;
    let params: BootParams = parse_body(&body)?;
    let stored = state.store.set(&id, params).await?;
    info!("Created boot parameters for {}", id);
    Ok((StatusCode::CREATED, Json(stored)))
}

/// `PUT /bootparams?id=` appends a version.
///
/// An unknown identifier is a client error here, not a 404.
pub async fn update_bootparams(
    State(state): State<AppState>,
    Query(query): Query<BootParamsQuery>,
    body: Bytes,
) -> Result<Json<BootParams>, ApiError> {
    let id = require_id(query.id)?;
    let params: BootParams = parse_body(&body)?;
    let stored = state.store.update(&id, params).await.map_err(|e| {
        if e.is_not_found() {
            ApiError::BadRequest(e.to_string())
        } else {
            ApiError::from(e)
        }
    })?;
    info!("Updated boot parameters for {} to version {}", id, stored.version);
    Ok(Json(stored))
}

/// `GET /bootparams?id=[&version=]`
///
/// Without `version` the current version is returned.
pub async fn get_bootparams(
    State(state): State<AppState>,
    Query(query): Query<BootParamsQuery>,
) -> Result<Json<BootParams>, ApiError> {
    let id = require_id(query.id)?;
    let params = match query.version.as_deref() {
        None | Some("") => state.store.get(&id).await?,
        Some("default") => state.store.get_default(&id).await?,
        Some(raw) => state.store.get_version(&id, parse_version(raw)?).await?,
    };
    Ok(Json(params))
}

/// `DELETE /bootparams?id=`
pub async fn delete_bootparams(
    State(state): State<AppState>,
    Query(query): Query<BootParamsQuery>,
) -> Result<StatusCode, ApiError> {
    let id = require_id(query.id)?;
    state.store.delete(&id).await?;
    info!("Deleted boot parameters for {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /bootparams/history?id=`
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<BootParamsQuery>,
) -> Result<Json<VersionedBootParams>, ApiError> {
    let id = require_id(query.id)?;
    Ok(Json(state.store.get_history(&id).await?))
}

/// `PUT /bootparams/default?id=&version=`
pub async fn set_default(
    State(state): State<AppState>,
    Query(query): Query<BootParamsQuery>,
) -> Result<StatusCode, ApiError> {
    let id = require_id(query.id)?;
    let raw = query
        .version
        .ok_or_else(|| ApiError::BadRequest("missing required query parameter 'version'".to_string()))?;
    let version = parse_version(&raw)?;
    state.store.set_default(&id, version).await?;
    info!("Default version of {} set to {}", id, version);
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /bootparams/ids`
pub async fn list_ids(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.store.list().await?))
}

/// `PUT /groups/{group}/template` binds a template version to a group.
pub async fn assign_group_template(
    State(state): State<AppState>,
    Path(group): Path<String>,
    body: Bytes,
) -> Result<Json<GroupBinding>, ApiError> {
    let request: AssignTemplateRequest = parse_body(&body)?;
    let version = state
        .store
        .assign_template_to_group(&request.id, &group, request.version)
        .await?;
    info!("Group {} bound to {} version {}", group, request.id, version);
    Ok(Json(GroupBinding {
        group,
        id: request.id,
        version,
    }))
}

/// `GET /groups/{group}/template` returns the bound boot parameters.
pub async fn get_group_template(
    State(state): State<AppState>,
    Path(group): Path<String>,
) -> Result<Json<BootParams>, ApiError> {
    debug!("Template lookup for group {}", group);
    Ok(Json(state.store.get_template_for_group(&group).await?))
}

/// `GET /groups/{group}` returns the binding itself.
pub async fn get_group_binding(
    State(state): State<AppState>,
    Path(group): Path<String>,
) -> Result<Json<GroupBinding>, ApiError> {
    Ok(Json(state.store.get_group_binding(&group).await?))
}

/// `DELETE /groups/{group}/template`
pub async fn unassign_group_template(
    State(state): State<AppState>,
    Path(group): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.unassign_group(&group).await?;
    info!("Group {} unbound", group);
    Ok(StatusCode::NO_CONTENT)
}
