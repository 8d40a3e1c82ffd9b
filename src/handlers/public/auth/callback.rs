use axum::extract::{Query, State};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::IssuedCredential;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /auth/callback - provider redirect target
///
/// The `state` must match a login started here; otherwise the code is never
/// sent to the provider.
pub async fn get(State(state): State<AppState>, Query(query): Query<CallbackQuery>) -> ApiResult<IssuedCredential> {
    let login_state = query
        .state
        .as_deref()
        .ok_or_else(|| ApiError::unauthorized("Login state is missing"))?;

    if let Some(error) = query.error.as_deref() {
        return Err(state.auth.abandon_login(login_state, error).into());
    }

    let code = query
        .code
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("Authorization code is missing"))?;

    let credential = state.auth.complete_login(login_state, code).await?;
    Ok(ApiResponse::success(credential))
}
