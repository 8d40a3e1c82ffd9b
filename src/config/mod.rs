use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::auth::handshake::DEFAULT_MAX_PENDING;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub oidc: OidcConfig,
    pub handshake: HandshakeConfig,
    pub security: SecurityConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

/// Identity-provider settings as read from the environment.
///
/// Required values stay optional here so that a missing one can be reported
/// per request instead of preventing startup. Use [`AppConfig::oidc`] to get
/// the validated form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcConfig {
    pub base_url: Option<String>,
    pub realm: Option<String>,
    pub client_id: Option<String>,
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub scope: String,
    pub audience: Option<String>,
    pub http_timeout_secs: u64,
    pub retry_attempts: u32,
    pub jwks_ttl_secs: u64,
}

/// Validated identity-provider settings
#[derive(Debug, Clone)]
pub struct OidcSettings {
    pub issuer: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scope: String,
    pub audience: Option<String>,
    pub http_timeout: Duration,
    pub retry_attempts: u32,
    pub jwks_ttl: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeConfig {
    pub pending_ttl_secs: u64,
    pub max_pending: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub seed_demo: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("required setting {0} is not set")]
    Missing(&'static str),
    #[error("setting {name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(port) = env::var("EDC_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse().ok())
        {
            self.server.port = port;
        }

        // Identity provider
        self.oidc.base_url = non_empty_var("OIDC_BASE_URL").or(self.oidc.base_url);
        self.oidc.realm = non_empty_var("OIDC_REALM").or(self.oidc.realm);
        self.oidc.client_id = non_empty_var("OIDC_CLIENT_ID").or(self.oidc.client_id);
        self.oidc.client_secret = non_empty_var("OIDC_CLIENT_SECRET").or(self.oidc.client_secret);
        self.oidc.redirect_uri = non_empty_var("OIDC_REDIRECT_URI").or(self.oidc.redirect_uri);
        self.oidc.audience = non_empty_var("OIDC_AUDIENCE").or(self.oidc.audience);
        if let Some(v) = non_empty_var("OIDC_SCOPE") {
            self.oidc.scope = v;
        }
        if let Ok(v) = env::var("OIDC_HTTP_TIMEOUT_SECS") {
            self.oidc.http_timeout_secs = v.parse().unwrap_or(self.oidc.http_timeout_secs);
        }
        if let Ok(v) = env::var("OIDC_RETRY_ATTEMPTS") {
            self.oidc.retry_attempts = v.parse().unwrap_or(self.oidc.retry_attempts);
        }
        if let Ok(v) = env::var("OIDC_JWKS_TTL_SECS") {
            self.oidc.jwks_ttl_secs = v.parse().unwrap_or(self.oidc.jwks_ttl_secs);
        }

        if let Ok(v) = env::var("HANDSHAKE_TTL_SECS") {
            self.handshake.pending_ttl_secs = v.parse().unwrap_or(self.handshake.pending_ttl_secs);
        }
        if let Ok(v) = env::var("HANDSHAKE_MAX_PENDING") {
            self.handshake.max_pending = v.parse().unwrap_or(self.handshake.max_pending);
        }

        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(v) = env::var("STORE_SEED_DEMO") {
            self.store.seed_demo = v.parse().unwrap_or(self.store.seed_demo);
        }

        self
    }

    /// Validated identity-provider settings, or the first missing/invalid one.
    pub fn oidc(&self) -> Result<OidcSettings, ConfigError> {
        let base_url = self.oidc.base_url.as_deref().ok_or(ConfigError::Missing("OIDC_BASE_URL"))?;
        let realm = self.oidc.realm.as_deref().ok_or(ConfigError::Missing("OIDC_REALM"))?;
        let client_id = self.oidc.client_id.clone().ok_or(ConfigError::Missing("OIDC_CLIENT_ID"))?;

        url::Url::parse(base_url).map_err(|e| ConfigError::Invalid {
            name: "OIDC_BASE_URL",
            reason: e.to_string(),
        })?;

        let redirect_uri = match &self.oidc.redirect_uri {
            Some(uri) => uri.clone(),
            None => format!("http://localhost:{}/auth/callback", self.server.port),
        };
        url::Url::parse(&redirect_uri).map_err(|e| ConfigError::Invalid {
            name: "OIDC_REDIRECT_URI",
            reason: e.to_string(),
        })?;

        Ok(OidcSettings {
            issuer: format!("{}/realms/{}", base_url.trim_end_matches('/'), realm),
            client_id,
            client_secret: self.oidc.client_secret.clone(),
            redirect_uri,
            scope: self.oidc.scope.clone(),
            audience: self.oidc.audience.clone(),
            http_timeout: Duration::from_secs(self.oidc.http_timeout_secs),
            retry_attempts: self.oidc.retry_attempts.max(1),
            jwks_ttl: Duration::from_secs(self.oidc.jwks_ttl_secs),
        })
    }

    pub fn handshake_ttl(&self) -> Duration {
        Duration::from_secs(self.handshake.pending_ttl_secs)
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 5000 },
            oidc: OidcConfig::defaults(10, 3),
            handshake: HandshakeConfig {
                pending_ttl_secs: 600,
                max_pending: DEFAULT_MAX_PENDING,
            },
            security: SecurityConfig {
                cors_origins: vec![
                    "http://localhost:5173".to_string(),
                    "http://127.0.0.1:5173".to_string(),
                    "http://localhost:5000".to_string(),
                    "http://localhost:3000".to_string(),
                ],
            },
            store: StoreConfig { seed_demo: true },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 5000 },
            oidc: OidcConfig::defaults(10, 3),
            handshake: HandshakeConfig {
                pending_ttl_secs: 600,
                max_pending: DEFAULT_MAX_PENDING,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            store: StoreConfig { seed_demo: true },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 5000 },
            oidc: OidcConfig::defaults(5, 3),
            handshake: HandshakeConfig {
                pending_ttl_secs: 300,
                max_pending: DEFAULT_MAX_PENDING,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://console.example.com".to_string()],
            },
            store: StoreConfig { seed_demo: false },
        }
    }
}

impl OidcConfig {
    fn defaults(http_timeout_secs: u64, retry_attempts: u32) -> Self {
        Self {
            base_url: None,
            realm: None,
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            scope: "openid profile email".to_string(),
            audience: None,
            http_timeout_secs,
            retry_attempts,
            jwks_ttl_secs: 300,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
