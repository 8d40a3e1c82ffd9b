use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// POST /api/auth/logout - end the provider session
///
/// The access token itself stays valid until it expires; clients drop it.
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Option<Json<LogoutRequest>>,
) -> ApiResult<()> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    state.auth.logout(request.refresh_token.as_deref()).await?;
    tracing::info!("User {} logged out", user.principal.username);
    Ok(ApiResponse::no_content())
}
