//! Identity-provider (OIDC) consumer side.
//!
//! [`IdentityProvider`] is the seam the handshake and the gatekeeper talk to.
//! [`OidcClient`] implements it against a real provider; [`UnconfiguredProvider`]
//! stands in when the provider settings are incomplete and fails every call.

pub mod client;
pub mod discovery;
pub mod error;
pub mod jwks;

pub use client::OidcClient;
pub use discovery::ProviderMetadata;
pub use error::OidcError;
pub use jwks::{KeyCache, SigningKey};

use async_trait::async_trait;
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// Token endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub refresh_expires_in: Option<i64>,
    #[serde(default)]
    pub id_token: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// User-info endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Expected `iss` claim of tokens issued by this provider
    fn issuer(&self) -> &str;

    /// Expected `aud` claim, when audience checking is enabled
    fn audience(&self) -> Option<&str>;

    async fn authorization_url(&self, state: &str, pkce_challenge: &str) -> Result<Url, OidcError>;

    async fn exchange_code(&self, code: &str, pkce_verifier: &str) -> Result<TokenSet, OidcError>;

    async fn exchange_password(&self, username: &str, password: &str) -> Result<TokenSet, OidcError>;

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, OidcError>;

    async fn end_session(&self, refresh_token: &str) -> Result<(), OidcError>;

    async fn user_info(&self, access_token: &str) -> Result<UserInfo, OidcError>;

    /// Key for verifying a token signed with `alg`, selected by `kid`
    async fn signing_key(&self, kid: Option<&str>, alg: Algorithm) -> Result<SigningKey, OidcError>;
}

/// Provider used when the configuration is incomplete. Every call fails with
/// [`OidcError::Configuration`], so nothing is ever admitted.
#[derive(Debug, Clone)]
pub struct UnconfiguredProvider {
    reason: String,
}

impl UnconfiguredProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    fn fail<T>(&self) -> Result<T, OidcError> {
        Err(OidcError::Configuration(self.reason.clone()))
    }
}

#[async_trait]
impl IdentityProvider for UnconfiguredProvider {
    fn issuer(&self) -> &str {
        ""
    }

    fn audience(&self) -> Option<&str> {
        None
    }

    async fn authorization_url(&self, _state: &str, _pkce_challenge: &str) -> Result<Url, OidcError> {
        self.fail()
    }

    async fn exchange_code(&self, _code: &str, _pkce_verifier: &str) -> Result<TokenSet, OidcError> {
        self.fail()
    }

    async fn exchange_password(&self, _username: &str, _password: &str) -> Result<TokenSet, OidcError> {
        self.fail()
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenSet, OidcError> {
        self.fail()
    }

    async fn end_session(&self, _refresh_token: &str) -> Result<(), OidcError> {
        self.fail()
    }

    async fn user_info(&self, _access_token: &str) -> Result<UserInfo, OidcError> {
        self.fail()
    }

    async fn signing_key(&self, _kid: Option<&str>, _alg: Algorithm) -> Result<SigningKey, OidcError> {
        self.fail()
    }
}
