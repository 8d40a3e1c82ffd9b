use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::oidc::UserInfo;

/// GET /api/auth/userinfo - the provider's user-info for the caller
pub async fn get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<UserInfo> {
    let info = state.auth.user_info(&user.access_token).await?;
    Ok(ApiResponse::success(info))
}
