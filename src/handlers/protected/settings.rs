use axum::extract::{rejection::JsonRejection, State};
use axum::Json;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::store::{DataspaceSettings, SettingsInput};

/// GET /api/settings/dataspace
pub async fn get(State(state): State<AppState>) -> ApiResult<DataspaceSettings> {
    Ok(ApiResponse::success(state.store.dataspace_settings()))
}

/// POST|PUT /api/settings/dataspace - replace the singleton's URLs
pub async fn upsert(
    State(state): State<AppState>,
    payload: Result<Json<SettingsInput>, JsonRejection>,
) -> ApiResult<DataspaceSettings> {
    let Json(input) = payload?;
    Ok(ApiResponse::success(state.store.upsert_dataspace_settings(input)))
}
