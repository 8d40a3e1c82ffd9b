use axum::Extension;
use chrono::Utc;

use crate::auth::SessionInfo;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/auth/me - principal behind the presented credential
pub async fn get(Extension(user): Extension<AuthUser>) -> ApiResult<SessionInfo> {
    let expires_in = (user.expires_at - Utc::now()).num_seconds().max(0);
    Ok(ApiResponse::success(SessionInfo {
        user: user.principal,
        expires_at: user.expires_at,
        expires_in,
    }))
}
