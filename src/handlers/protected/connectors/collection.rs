use axum::extract::{rejection::JsonRejection, State};
use axum::Json;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::store::{Connector, NewConnector};

/// GET /api/connectors - all registrations in creation order
pub async fn get(State(state): State<AppState>) -> ApiResult<Vec<Connector>> {
    Ok(ApiResponse::success(state.store.list_connectors()))
}

/// POST /api/connectors - register a connector; id and status are assigned here
pub async fn post(
    State(state): State<AppState>,
    payload: Result<Json<NewConnector>, JsonRejection>,
) -> ApiResult<Connector> {
    let Json(input) = payload?;
    input
        .validate()
        .map_err(|errors| ApiError::validation_error("Invalid connector data", Some(errors)))?;

    let connector = state.store.create_connector(input);
    tracing::info!("Created connector {} ({})", connector.id, connector.name);
    let location = format!("/api/connectors/{}", connector.id);
    Ok(ApiResponse::created(connector, location))
}
