use axum::extract::{rejection::JsonRejection, Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::parse_id;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::store::{Connector, ConnectorPatch, ConnectorStatus};

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: Uuid,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// GET /api/connectors/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Connector> {
    let connector = state.store.get_connector(parse_id(&id)?)?;
    Ok(ApiResponse::success(connector))
}

/// PUT /api/connectors/:id - partial update; status is left alone
pub async fn put(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ConnectorPatch>, JsonRejection>,
) -> ApiResult<Connector> {
    let id = parse_id(&id)?;
    let Json(patch) = payload?;
    patch
        .validate()
        .map_err(|errors| ApiError::validation_error("Invalid connector data", Some(errors)))?;

    let connector = state.store.update_connector(id, patch)?;
    Ok(ApiResponse::success(connector))
}

/// DELETE /api/connectors/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Deleted> {
    let removed = state.store.delete_connector(parse_id(&id)?)?;
    tracing::info!("Deleted connector {} ({})", removed.id, removed.name);
    Ok(ApiResponse::success(Deleted {
        id: removed.id,
        message: "Connector deleted successfully",
    }))
}

/// PATCH /api/connectors/:id/status
pub async fn status_patch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult<Connector> {
    let id = parse_id(&id)?;
    let Json(body) = payload?;
    let status: ConnectorStatus = body.status.parse().map_err(|e: String| {
        let mut errors = crate::store::models::FieldErrors::new();
        errors.insert("status".to_string(), e);
        ApiError::validation_error("Invalid connector status", Some(errors))
    })?;

    let connector = state.store.set_connector_status(id, status)?;
    Ok(ApiResponse::success(connector))
}
