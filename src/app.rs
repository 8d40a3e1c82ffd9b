//! Shared application state and the HTTP router.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::Authenticator;
use crate::config::{AppConfig, SecurityConfig};
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::require_auth;
use crate::oidc::{IdentityProvider, OidcClient, OidcError, UnconfiguredProvider};
use crate::store::MemoryStore;

/// State shared by every handler. Built once per process.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<Authenticator>,
    pub store: Arc<MemoryStore>,
}

impl AppState {
    pub fn new(config: AppConfig, provider: Arc<dyn IdentityProvider>, store: MemoryStore) -> Self {
        let auth = Authenticator::new(provider, config.handshake_ttl())
            .with_max_pending_logins(config.handshake.max_pending);
        Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
            store: Arc::new(store),
        }
    }

    /// Wire the real identity provider from `config`.
    ///
    /// Incomplete provider settings do not stop the server: credential routes
    /// answer with a configuration error and the gatekeeper admits nobody.
    pub fn from_config(config: AppConfig) -> Self {
        let provider: Arc<dyn IdentityProvider> =
            match config.oidc().map_err(OidcError::from).and_then(OidcClient::new) {
                Ok(client) => {
                    tracing::info!("Identity provider issuer: {}", client.issuer());
                    Arc::new(client)
                }
                Err(e) => {
                    tracing::error!("Authentication disabled, {}", e);
                    Arc::new(UnconfiguredProvider::new(e.to_string()))
                }
            };

        let store = if config.store.seed_demo {
            MemoryStore::with_demo_data()
        } else {
            MemoryStore::new()
        };

        Self::new(config, provider, store)
    }
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    Router::new()
        // Public
        .route("/", get(public::root::root))
        .route("/health", get(public::root::health))
        .merge(auth_public_routes())
        // Protected API
        .merge(api_routes(state.clone()))
        .fallback(not_found)
        // Global middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/authorize", get(auth::authorize_get).post(auth::authorize_post))
        .route("/auth/callback", get(auth::callback_get))
        .route("/auth/token", post(auth::token_post))
        .route("/auth/refresh", post(auth::refresh_post))
}

fn api_routes(state: AppState) -> Router<AppState> {
    use protected::{auth, connectors, settings, stats};

    Router::new()
        // Session
        .route("/api/auth/me", get(auth::me_get))
        .route("/api/auth/userinfo", get(auth::userinfo_get))
        .route("/api/auth/logout", post(auth::logout_post))
        // Connectors
        .route(
            "/api/connectors",
            get(connectors::connectors_get).post(connectors::connectors_post),
        )
        .route(
            "/api/connectors/:id",
            get(connectors::connector_get)
                .put(connectors::connector_put)
                .delete(connectors::connector_delete),
        )
        .route(
            "/api/connectors/:id/status",
            patch(connectors::connector_status_patch),
        )
        // Settings and stats
        .route(
            "/api/settings/dataspace",
            get(settings::get).post(settings::upsert).put(settings::upsert),
        )
        .route("/api/stats", get(stats::get))
        .route_layer(from_fn_with_state(state, require_auth))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let allow_origin = if security.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            security
                .cors_origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}
