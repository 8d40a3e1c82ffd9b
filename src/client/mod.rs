//! Client for the console API.
//!
//! [`ApiClient`] attaches the stored credential to every call, refreshes it
//! shortly before expiry, and drops it as soon as the server refuses it.

pub mod credentials;
pub mod error;
pub mod session;

pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::ClientError;
pub use session::{SessionEvent, SessionMachine, SessionState};

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

use crate::auth::{AuthorizationRequest, IssuedCredential, SessionInfo};
use crate::oidc::UserInfo;
use crate::store::{
    Connector, ConnectorPatch, ConnectorStatus, DataspaceSettings, NewConnector, SettingsInput, Stats,
};

/// Refresh when the credential has less than this left
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(30);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error body produced by the server's `ApiError`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
    credentials: Arc<dyn CredentialStore>,
    session: Mutex<SessionMachine>,
    refresh_margin: chrono::Duration,
    // one refresh at a time; a second caller reuses the first one's result
    refresh_lock: tokio::sync::Mutex<()>,
}

impl ApiClient {
    pub fn new(base_url: &str, credentials: Arc<dyn CredentialStore>) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)?;
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        // a credential left by an earlier run resumes the session
        let initial = match credentials.load()? {
            Some(_) => SessionState::Authenticated,
            None => SessionState::Anonymous,
        };

        Ok(Self {
            base_url,
            http,
            credentials,
            session: Mutex::new(SessionMachine::new(initial)),
            refresh_margin: to_chrono(DEFAULT_REFRESH_MARGIN),
            refresh_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = to_chrono(margin);
        self
    }

    pub fn session_state(&self) -> SessionState {
        self.session.lock().unwrap_or_else(PoisonError::into_inner).state()
    }

    pub fn credential(&self) -> Result<Option<IssuedCredential>, ClientError> {
        self.credentials.load()
    }

    // ---------- Handshake ----------

    /// Direct exchange of username and password for a credential
    pub async fn login(&self, username: &str, password: &str, remember_me: bool) -> Result<IssuedCredential, ClientError> {
        let body = json!({ "username": username, "password": password, "remember_me": remember_me });
        let response = self.request(Method::POST, "/auth/token")?.json(&body).send().await?;
        let credential: IssuedCredential = parse(response).await?;

        self.transition(SessionEvent::DirectExchangeOk)?;
        self.store_new(&credential)?;
        Ok(credential)
    }

    /// Start a redirect login; the user opens the returned URL in a browser
    pub async fn begin_authorization(&self) -> Result<AuthorizationRequest, ClientError> {
        let response = self.request(Method::POST, "/auth/authorize")?.send().await?;
        let request: AuthorizationRequest = parse(response).await?;
        self.transition(SessionEvent::HandshakeStarted)?;
        Ok(request)
    }

    /// Finish a redirect login with the values the provider sent back
    pub async fn complete_authorization(&self, code: &str, state: &str) -> Result<IssuedCredential, ClientError> {
        let response = self
            .request(Method::GET, "/auth/callback")?
            .query(&[("code", code), ("state", state)])
            .send()
            .await?;

        match parse::<IssuedCredential>(response).await {
            Ok(credential) => {
                self.transition(SessionEvent::ProviderCallbackOk)?;
                self.store_new(&credential)?;
                Ok(credential)
            }
            Err(e) => {
                self.transition(SessionEvent::Rejected)?;
                Err(e)
            }
        }
    }

    /// Refresh now, regardless of how much lifetime is left
    pub async fn refresh(&self) -> Result<IssuedCredential, ClientError> {
        let _guard = self.refresh_lock.lock().await;
        let credential = self.stored_or_reauth()?;
        self.refresh_locked(credential).await
    }

    /// End the session at the server and forget the credential locally.
    ///
    /// Local state is cleared even when the server call fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let stored = self.credentials.load()?;
        let result = match &stored {
            Some(credential) if !credential.is_expired(Utc::now()) => {
                let body = json!({ "refresh_token": credential.refresh_token });
                match self
                    .request(Method::POST, "/api/auth/logout")?
                    .bearer_auth(&credential.access_token)
                    .json(&body)
                    .send()
                    .await
                {
                    Ok(response) => check(response).await.map(|_| ()),
                    Err(e) => Err(e.into()),
                }
            }
            _ => Ok(()),
        };

        self.credentials.clear()?;
        self.transition(SessionEvent::Logout)?;

        if let Err(e) = &result {
            tracing::warn!("Server-side logout failed: {}", e);
        }
        Ok(())
    }

    pub async fn me(&self) -> Result<SessionInfo, ClientError> {
        self.call(Method::GET, "/api/auth/me", None).await
    }

    pub async fn user_info(&self) -> Result<UserInfo, ClientError> {
        self.call(Method::GET, "/api/auth/userinfo", None).await
    }

    // ---------- Connectors ----------

    pub async fn list_connectors(&self) -> Result<Vec<Connector>, ClientError> {
        self.call(Method::GET, "/api/connectors", None).await
    }

    pub async fn get_connector(&self, id: Uuid) -> Result<Connector, ClientError> {
        self.call(Method::GET, &format!("/api/connectors/{}", id), None).await
    }

    pub async fn create_connector(&self, input: &NewConnector) -> Result<Connector, ClientError> {
        self.call(Method::POST, "/api/connectors", Some(serde_json::to_value(input)?))
            .await
    }

    pub async fn update_connector(&self, id: Uuid, patch: &ConnectorPatch) -> Result<Connector, ClientError> {
        self.call(Method::PUT, &format!("/api/connectors/{}", id), Some(serde_json::to_value(patch)?))
            .await
    }

    pub async fn delete_connector(&self, id: Uuid) -> Result<(), ClientError> {
        let _: serde_json::Value = self.call(Method::DELETE, &format!("/api/connectors/{}", id), None).await?;
        Ok(())
    }

    pub async fn set_connector_status(&self, id: Uuid, status: ConnectorStatus) -> Result<Connector, ClientError> {
        self.call(
            Method::PATCH,
            &format!("/api/connectors/{}/status", id),
            Some(json!({ "status": status })),
        )
        .await
    }

    // ---------- Settings and stats ----------

    pub async fn dataspace_settings(&self) -> Result<DataspaceSettings, ClientError> {
        self.call(Method::GET, "/api/settings/dataspace", None).await
    }

    pub async fn update_dataspace_settings(&self, input: &SettingsInput) -> Result<DataspaceSettings, ClientError> {
        self.call(Method::PUT, "/api/settings/dataspace", Some(serde_json::to_value(input)?))
            .await
    }

    pub async fn stats(&self) -> Result<Stats, ClientError> {
        self.call(Method::GET, "/api/stats", None).await
    }

    // ---------- Background refresh ----------

    /// Check the credential every `period` and refresh it before it expires.
    ///
    /// Stops once the session needs a new login or the client is dropped.
    pub fn spawn_refresh_task(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let client = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let Some(client) = client.upgrade() else {
                    break;
                };
                match client.current_token().await {
                    Ok(_) => {}
                    Err(ClientError::ReauthenticationRequired(reason)) => {
                        tracing::info!("Background refresh stopped: {}", reason);
                        break;
                    }
                    // outages leave the credential in place; try again next tick
                    Err(e) => tracing::warn!("Background refresh failed: {}", e),
                }
            }
        })
    }

    // ---------- Internals ----------

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.base_url.join(path)?;
        Ok(self.http.request(method, url))
    }

    /// Authenticated call: attach a fresh credential, map 401 to a reset
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ClientError> {
        let token = self.current_token().await?;

        let mut builder = self.request(method, path)?.bearer_auth(token);
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        let response = builder.send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let reason = error_message(response).await;
            self.reset(SessionEvent::Rejected)?;
            return Err(ClientError::ReauthenticationRequired(reason));
        }
        parse(response).await
    }

    /// Access token good for at least the refresh margin, refreshing if needed.
    ///
    /// While the refresh endpoint is down, an unexpired token is still handed out.
    async fn current_token(&self) -> Result<String, ClientError> {
        let _guard = self.refresh_lock.lock().await;
        let credential = self.stored_or_reauth()?;

        if !credential.expires_within(self.refresh_margin, Utc::now()) {
            return Ok(credential.access_token);
        }
        match self.refresh_locked(credential.clone()).await {
            Ok(fresh) => Ok(fresh.access_token),
            Err(e) if e.is_transient() && !credential.is_expired(Utc::now()) => Ok(credential.access_token),
            Err(e) => Err(e),
        }
    }

    /// Caller holds `refresh_lock`
    async fn refresh_locked(&self, credential: IssuedCredential) -> Result<IssuedCredential, ClientError> {
        self.transition(SessionEvent::NearExpiry)?;

        let refresh_token = match credential.refresh_token.as_deref() {
            Some(token) if credential.can_refresh(Utc::now()) => token,
            _ => {
                self.reset(SessionEvent::RefreshFailed)?;
                return Err(ClientError::ReauthenticationRequired(
                    "credential expired and cannot be refreshed".to_string(),
                ));
            }
        };

        let outcome = match self
            .request(Method::POST, "/auth/refresh")?
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
        {
            Ok(response) => parse::<IssuedCredential>(response).await,
            Err(e) => Err(e.into()),
        };

        match outcome {
            Ok(fresh) => {
                self.credentials.save(&fresh)?;
                self.transition(SessionEvent::RefreshSucceeded)?;
                Ok(fresh)
            }
            Err(e) if e.is_transient() => {
                tracing::warn!("Credential refresh deferred: {}", e);
                self.transition(SessionEvent::RefreshDeferred)?;
                Err(e)
            }
            Err(e) => {
                tracing::warn!("Credential refresh failed: {}", e);
                self.reset(SessionEvent::RefreshFailed)?;
                Err(ClientError::ReauthenticationRequired(format!("refresh failed: {}", e)))
            }
        }
    }

    fn stored_or_reauth(&self) -> Result<IssuedCredential, ClientError> {
        self.credentials
            .load()?
            .ok_or_else(|| ClientError::ReauthenticationRequired("not logged in".to_string()))
    }

    fn transition(&self, event: SessionEvent) -> Result<SessionState, ClientError> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner).apply(event)
    }

    /// Persist a credential from a login the session already accepted
    fn store_new(&self, credential: &IssuedCredential) -> Result<(), ClientError> {
        if let Err(e) = self.credentials.save(credential) {
            self.transition(SessionEvent::Rejected)?;
            return Err(e);
        }
        Ok(())
    }

    /// Forget the credential and end the session
    fn reset(&self, event: SessionEvent) -> Result<(), ClientError> {
        self.credentials.clear()?;
        self.transition(event)?;
        Ok(())
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::seconds(30))
}

/// Pass a successful response through, or turn its error body into `ClientError::Api`
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let (message, code) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.message, body.code),
        Err(_) => (status.canonical_reason().unwrap_or("request failed").to_string(), None),
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    Ok(check(response).await?.json::<T>().await?)
}

async fn error_message(response: Response) -> String {
    match check(response).await {
        Err(ClientError::Api { message, .. }) => message,
        _ => "credential rejected".to_string(),
    }
}
