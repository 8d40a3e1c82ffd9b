use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::IssuedCredential;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::store::models::FieldErrors;

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Client-side storage choice; has no effect on the credential itself
    #[serde(default)]
    pub remember_me: bool,
}

/// POST /auth/token - exchange username and password at the provider
pub async fn post(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> ApiResult<IssuedCredential> {
    let Json(body) = payload?;

    let mut field_errors = FieldErrors::new();
    if body.username.trim().is_empty() {
        field_errors.insert("username".to_string(), "This field is required".to_string());
    }
    if body.password.is_empty() {
        field_errors.insert("password".to_string(), "This field is required".to_string());
    }
    if !field_errors.is_empty() {
        return Err(ApiError::validation_error("Invalid request data", Some(field_errors)));
    }

    tracing::debug!("Direct login for {} (remember_me={})", body.username.trim(), body.remember_me);
    let credential = state
        .auth
        .login_with_password(body.username.trim(), &body.password)
        .await?;
    Ok(ApiResponse::success(credential))
}
