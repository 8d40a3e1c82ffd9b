use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use tokio::sync::OnceCell;
use url::Url;

use super::discovery::ProviderMetadata;
use super::jwks::{signing_key_from_jwk, KeyCache, SigningKey};
use super::{IdentityProvider, OidcError, TokenSet, UserInfo};
use crate::config::OidcSettings;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

/// Identity-provider client for a single realm.
///
/// Constructed once per process and shared through `AppState`. The discovery
/// document is fetched on first use and kept for the life of the client.
pub struct OidcClient {
    settings: OidcSettings,
    http: reqwest::Client,
    metadata: OnceCell<ProviderMetadata>,
    keys: KeyCache,
}

/// OAuth error body returned by token and user-info endpoints
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl OidcClient {
    pub fn new(settings: OidcSettings) -> Result<Self, OidcError> {
        let http = reqwest::Client::builder()
            .timeout(settings.http_timeout)
            .build()
            .map_err(|e| OidcError::Configuration(format!("http client: {}", e)))?;

        Ok(Self {
            keys: KeyCache::new(settings.jwks_ttl),
            settings,
            http,
            metadata: OnceCell::new(),
        })
    }

    pub async fn metadata(&self) -> Result<&ProviderMetadata, OidcError> {
        self.metadata
            .get_or_try_init(|| {
                with_retry(self.settings.retry_attempts, RETRY_BASE_DELAY, "OIDC discovery", OidcError::is_transient, move || {
                    ProviderMetadata::discover(&self.http, &self.settings.issuer)
                })
            })
            .await
    }

    async fn token_request(&self, grant: &str, params: &[(&str, &str)]) -> Result<TokenSet, OidcError> {
        let endpoint = self.metadata().await?.token_endpoint.as_str();

        let mut form: Vec<(&str, &str)> = vec![("grant_type", grant), ("client_id", self.settings.client_id.as_str())];
        if let Some(secret) = self.settings.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }
        form.extend_from_slice(params);

        // codes and refresh tokens are single use; resend only if nothing reached the provider
        let retry_if: fn(&OidcError) -> bool = match grant {
            "authorization_code" | "refresh_token" => OidcError::is_unreachable,
            _ => OidcError::is_transient,
        };

        let http = &self.http;
        let form = &form;
        with_retry(self.settings.retry_attempts, RETRY_BASE_DELAY, grant, retry_if, move || async move {
            let response = check_status(http.post(endpoint).form(form).send().await?).await?;
            response
                .json::<TokenSet>()
                .await
                .map_err(|e| OidcError::InvalidResponse(format!("token response: {}", e)))
        })
        .await
    }

    async fn fetch_keys(&self) -> Result<JwkSet, OidcError> {
        let jwks_uri = self.metadata().await?.jwks_uri.as_str();
        let http = &self.http;
        with_retry(self.settings.retry_attempts, RETRY_BASE_DELAY, "JWKS fetch", OidcError::is_transient, move || async move {
            let response = check_status(http.get(jwks_uri).send().await?).await?;
            response
                .json::<JwkSet>()
                .await
                .map_err(|e| OidcError::InvalidResponse(format!("key set: {}", e)))
        })
        .await
    }
}

#[async_trait]
impl IdentityProvider for OidcClient {
    fn issuer(&self) -> &str {
        &self.settings.issuer
    }

    fn audience(&self) -> Option<&str> {
        self.settings.audience.as_deref()
    }

    async fn authorization_url(&self, state: &str, pkce_challenge: &str) -> Result<Url, OidcError> {
        let endpoint = &self.metadata().await?.authorization_endpoint;
        let mut url = Url::parse(endpoint)
            .map_err(|e| OidcError::InvalidResponse(format!("authorization endpoint: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", self.settings.client_id.as_str())
            .append_pair("redirect_uri", self.settings.redirect_uri.as_str())
            .append_pair("scope", self.settings.scope.as_str())
            .append_pair("state", state)
            .append_pair("code_challenge", pkce_challenge)
            .append_pair("code_challenge_method", "S256");

        Ok(url)
    }

    async fn exchange_code(&self, code: &str, pkce_verifier: &str) -> Result<TokenSet, OidcError> {
        self.token_request(
            "authorization_code",
            &[
                ("code", code),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
                ("code_verifier", pkce_verifier),
            ],
        )
        .await
    }

    async fn exchange_password(&self, username: &str, password: &str) -> Result<TokenSet, OidcError> {
        self.token_request(
            "password",
            &[("username", username), ("password", password), ("scope", self.settings.scope.as_str())],
        )
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, OidcError> {
        self.token_request("refresh_token", &[("refresh_token", refresh_token)]).await
    }

    async fn end_session(&self, refresh_token: &str) -> Result<(), OidcError> {
        let Some(endpoint) = self.metadata().await?.end_session_endpoint.as_deref() else {
            tracing::debug!("Provider publishes no end_session_endpoint; nothing to revoke");
            return Ok(());
        };

        let mut form: Vec<(&str, &str)> = vec![
            ("client_id", self.settings.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];
        if let Some(secret) = self.settings.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        check_status(self.http.post(endpoint).form(&form).send().await?).await?;
        Ok(())
    }

    async fn user_info(&self, access_token: &str) -> Result<UserInfo, OidcError> {
        let endpoint = self
            .metadata()
            .await?
            .userinfo_endpoint
            .as_deref()
            .ok_or_else(|| OidcError::Configuration("provider publishes no userinfo_endpoint".into()))?;

        let response = check_status(self.http.get(endpoint).bearer_auth(access_token).send().await?).await?;
        response
            .json::<UserInfo>()
            .await
            .map_err(|e| OidcError::InvalidResponse(format!("userinfo response: {}", e)))
    }

    async fn signing_key(&self, kid: Option<&str>, alg: Algorithm) -> Result<SigningKey, OidcError> {
        let jwk = self.keys.find(kid, || self.fetch_keys()).await?;
        signing_key_from_jwk(&jwk, alg)
    }
}

/// Map a provider response status onto the error taxonomy.
///
/// 5xx is transient; any other non-success status means the provider refused.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, OidcError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();

    if status.is_server_error() {
        return Err(OidcError::Unavailable(format!("{} returned {}", url.path(), status)));
    }

    let reason = match serde_json::from_str::<ProviderErrorBody>(&body) {
        Ok(err) => match err.error_description {
            Some(description) => format!("{}: {}", err.error, description),
            None => err.error,
        },
        Err(_) => status.to_string(),
    };
    Err(OidcError::Rejected(reason))
}

/// Run `op`, retrying failures accepted by `retry_if` with exponential backoff
pub(crate) async fn with_retry<T, F, Fut>(
    attempts: u32,
    base_delay: Duration,
    what: &str,
    retry_if: fn(&OidcError) -> bool,
    mut op: F,
) -> Result<T, OidcError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, OidcError>>,
{
    let mut attempt = 1;
    let mut delay = base_delay;
    loop {
        match op().await {
            Err(e) if retry_if(&e) && attempt < attempts => {
                tracing::warn!("{} failed (attempt {}/{}): {}; retrying in {:?}", what, attempt, attempts, e, delay);
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            other => return other,
        }
    }
}
