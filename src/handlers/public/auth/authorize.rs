use axum::{extract::State, response::Redirect};

use crate::app::AppState;
use crate::auth::AuthorizationRequest;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /auth/authorize - send the browser to the provider's login page
pub async fn get(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    let request = state.auth.begin_login().await?;
    Ok(Redirect::to(&request.authorization_url))
}

/// POST /auth/authorize - start a redirect login and hand back the URL
pub async fn post(State(state): State<AppState>) -> ApiResult<AuthorizationRequest> {
    let request = state.auth.begin_login().await?;
    Ok(ApiResponse::success(request))
}
