use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::store::Stats;

/// GET /api/stats
pub async fn get(State(state): State<AppState>) -> ApiResult<Stats> {
    Ok(ApiResponse::success(state.store.stats()))
}
