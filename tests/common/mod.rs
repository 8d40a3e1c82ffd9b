#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde_json::Value;
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;

use edc_console_api::app::{router, AppState};
use edc_console_api::config::AppConfig;
use edc_console_api::oidc::{IdentityProvider, OidcError, SigningKey, TokenSet, UserInfo};
use edc_console_api::store::MemoryStore;

pub const ISSUER: &str = "https://idp.integration/realms/CX-Central";
pub const KID: &str = "integration-key";
pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "admin-password";
pub const SUBJECT: &str = "f3c2b1a0-admin";
pub const GOOD_CODE: &str = "good-code";

const SECRET: &[u8] = b"integration-signing-secret";

/// Identity provider living in the test process. Tokens are HS256 with a
/// fixed secret; refresh tokens are single use.
pub struct FakeProvider {
    access_lifetime: i64,
    refresh_lifetime: i64,
    code_exchanges: AtomicUsize,
    password_exchanges: AtomicUsize,
    refreshes: AtomicUsize,
    refresh_outage: AtomicBool,
    refresh_tokens: Mutex<HashMap<String, i64>>,
    last_exp: Mutex<i64>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::with_lifetimes(300, 1800)
    }

    pub fn with_lifetimes(access_lifetime: i64, refresh_lifetime: i64) -> Self {
        Self {
            access_lifetime,
            refresh_lifetime,
            code_exchanges: AtomicUsize::new(0),
            password_exchanges: AtomicUsize::new(0),
            refreshes: AtomicUsize::new(0),
            refresh_outage: AtomicBool::new(false),
            refresh_tokens: Mutex::new(HashMap::new()),
            last_exp: Mutex::new(0),
        }
    }

    pub fn code_exchanges(&self) -> usize {
        self.code_exchanges.load(Ordering::SeqCst)
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    /// While set, the token endpoint answers refresh grants as if it were down
    pub fn set_refresh_outage(&self, down: bool) {
        self.refresh_outage.store(down, Ordering::SeqCst);
    }

    fn issue(&self) -> TokenSet {
        let now = Utc::now().timestamp();
        let exp = {
            let mut last = self.last_exp.lock().unwrap();
            *last = (now + self.access_lifetime).max(*last + 1);
            *last
        };

        let refresh_token = Uuid::new_v4().to_string();
        self.refresh_tokens
            .lock()
            .unwrap()
            .insert(refresh_token.clone(), now + self.refresh_lifetime);

        TokenSet {
            access_token: mint_token(ISSUER, KID, exp),
            token_type: "Bearer".into(),
            expires_in: Some(exp - now),
            refresh_token: Some(refresh_token),
            refresh_expires_in: Some(self.refresh_lifetime),
            id_token: None,
        }
    }
}

/// Token for the test user signed with the shared secret
pub fn mint_token(issuer: &str, kid: &str, exp: i64) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(kid.to_string());
    let claims = serde_json::json!({
        "sub": SUBJECT,
        "iss": issuer,
        "exp": exp,
        "iat": Utc::now().timestamp(),
        "preferred_username": USERNAME,
        "email": "admin@example.com",
        "realm_access": { "roles": ["edc-admin"] },
    });
    encode(&header, &claims, &EncodingKey::from_secret(SECRET)).unwrap()
}

pub fn valid_token() -> String {
    mint_token(ISSUER, KID, Utc::now().timestamp() + 300)
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn issuer(&self) -> &str {
        ISSUER
    }

    fn audience(&self) -> Option<&str> {
        None
    }

    async fn authorization_url(&self, state: &str, pkce_challenge: &str) -> Result<Url, OidcError> {
        let mut url = Url::parse(&format!("{}/protocol/openid-connect/auth", ISSUER)).unwrap();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("state", state)
            .append_pair("code_challenge", pkce_challenge)
            .append_pair("code_challenge_method", "S256");
        Ok(url)
    }

    async fn exchange_code(&self, code: &str, _pkce_verifier: &str) -> Result<TokenSet, OidcError> {
        self.code_exchanges.fetch_add(1, Ordering::SeqCst);
        if code == GOOD_CODE {
            Ok(self.issue())
        } else {
            Err(OidcError::Rejected("invalid_grant: Code not valid".into()))
        }
    }

    async fn exchange_password(&self, username: &str, password: &str) -> Result<TokenSet, OidcError> {
        self.password_exchanges.fetch_add(1, Ordering::SeqCst);
        if username == USERNAME && password == PASSWORD {
            Ok(self.issue())
        } else {
            Err(OidcError::Rejected("invalid_grant: Invalid user credentials".into()))
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, OidcError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        if self.refresh_outage.load(Ordering::SeqCst) {
            return Err(OidcError::Unavailable("token endpoint returned 503".into()));
        }
        let deadline = self.refresh_tokens.lock().unwrap().remove(refresh_token);
        match deadline {
            Some(deadline) if deadline > Utc::now().timestamp() => Ok(self.issue()),
            _ => Err(OidcError::Rejected("invalid_grant: Token is not active".into())),
        }
    }

    async fn end_session(&self, refresh_token: &str) -> Result<(), OidcError> {
        match self.refresh_tokens.lock().unwrap().remove(refresh_token) {
            Some(_) => Ok(()),
            None => Err(OidcError::Rejected("invalid_grant: Session not active".into())),
        }
    }

    async fn user_info(&self, _access_token: &str) -> Result<UserInfo, OidcError> {
        Ok(UserInfo {
            sub: SUBJECT.into(),
            preferred_username: Some(USERNAME.into()),
            email: Some("admin@example.com".into()),
            other: Default::default(),
        })
    }

    async fn signing_key(&self, kid: Option<&str>, alg: Algorithm) -> Result<SigningKey, OidcError> {
        if kid != Some(KID) {
            return Err(OidcError::UnknownSigningKey(kid.map(str::to_string)));
        }
        if alg != Algorithm::HS256 {
            return Err(OidcError::KeyMismatch(format!("{:?}", alg)));
        }
        Ok(SigningKey {
            key: DecodingKey::from_secret(SECRET),
            algorithm: alg,
        })
    }
}

/// Router over an empty store, backed by `provider`
pub fn test_app(provider: Arc<dyn IdentityProvider>) -> (Router, AppState) {
    test_app_with(provider, |_| {})
}

/// Like [`test_app`], with `tweak` applied to the development config first
pub fn test_app_with(provider: Arc<dyn IdentityProvider>, tweak: impl FnOnce(&mut AppConfig)) -> (Router, AppState) {
    let mut config = AppConfig::development();
    config.store.seed_demo = false;
    tweak(&mut config);
    let state = AppState::new(config, provider, MemoryStore::new());
    (router(state.clone()), state)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

/// Drive one request through the router without a socket
pub async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<TestResponse> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await.context("router call failed")?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).context("response body is not JSON")?
    };

    Ok(TestResponse { status, headers, body })
}

/// Password login through the router, returning the credential body
pub async fn login(app: &Router) -> Result<Value> {
    let res = send(
        app,
        Method::POST,
        "/auth/token",
        None,
        Some(serde_json::json!({ "username": USERNAME, "password": PASSWORD })),
    )
    .await?;
    anyhow::ensure!(res.status == StatusCode::OK, "login failed: {} {}", res.status, res.body);
    Ok(res.body)
}

/// Serve the router on a free local port and return its base URL
pub async fn spawn_server(app: Router) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(format!("http://127.0.0.1:{}", port))
}
