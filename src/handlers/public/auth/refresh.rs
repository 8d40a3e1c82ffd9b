use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::IssuedCredential;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// POST /auth/refresh - trade a refresh token for a new credential
pub async fn post(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<IssuedCredential> {
    let Json(body) = payload?;
    if body.refresh_token.is_empty() {
        return Err(ApiError::unauthorized("Refresh token is required"));
    }

    let credential = state.auth.refresh(&body.refresh_token).await?;
    Ok(ApiResponse::success(credential))
}
