use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - service description
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "EDC Console API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Connector registrations and dataspace settings behind OIDC bearer authentication",
        "endpoints": {
            "public": ["/health", "/auth/authorize", "/auth/callback", "/auth/token", "/auth/refresh"],
            "protected": ["/api/auth/me", "/api/auth/userinfo", "/api/auth/logout", "/api/connectors", "/api/settings/dataspace", "/api/stats"]
        }
    }))
}

/// GET /health - liveness, plus whether credential routes can work at all
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let auth = match state.config.oidc() {
        Ok(_) => "configured",
        Err(_) => "unconfigured",
    };
    Json(json!({
        "status": "ok",
        "environment": format!("{:?}", state.config.environment).to_lowercase(),
        "auth": auth,
        "connectors": state.store.list_connectors().len(),
    }))
}
