use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::{AuthError, AuthorizationRequest, HandshakeError, HandshakeRegistry, IssuedCredential, TokenVerifier};
use crate::oidc::{IdentityProvider, OidcError, TokenSet, UserInfo};

/// Credential issuance, refresh and revocation against one identity provider.
///
/// Built once at startup and shared by every handler through `AppState`.
pub struct Authenticator {
    provider: Arc<dyn IdentityProvider>,
    verifier: TokenVerifier,
    handshakes: HandshakeRegistry,
}

impl Authenticator {
    pub fn new(provider: Arc<dyn IdentityProvider>, handshake_ttl: Duration) -> Self {
        Self {
            verifier: TokenVerifier::new(provider.clone()),
            handshakes: HandshakeRegistry::new(provider.clone(), handshake_ttl),
            provider,
        }
    }

    /// Cap the number of redirect logins pending at once
    pub fn with_max_pending_logins(mut self, max_pending: usize) -> Self {
        self.handshakes = self.handshakes.with_max_pending(max_pending);
        self
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    pub fn handshakes(&self) -> &HandshakeRegistry {
        &self.handshakes
    }

    pub async fn begin_login(&self) -> Result<AuthorizationRequest, AuthError> {
        self.handshakes.begin().await
    }

    pub async fn complete_login(&self, state: &str, code: &str) -> Result<IssuedCredential, AuthError> {
        let tokens = self.handshakes.complete(state, code).await?;
        let credential = self.issue(tokens).await?;
        tracing::info!("User {} logged in via provider redirect", credential.user.username);
        Ok(credential)
    }

    /// The provider came back with an error instead of a code
    pub fn abandon_login(&self, state: &str, error: &str) -> HandshakeError {
        self.handshakes.abandon(state, error)
    }

    pub async fn login_with_password(&self, username: &str, password: &str) -> Result<IssuedCredential, AuthError> {
        let tokens = self.provider.exchange_password(username, password).await?;
        let credential = self.issue(tokens).await?;
        tracing::info!("User {} logged in with direct exchange", credential.user.username);
        Ok(credential)
    }

    /// Trade a refresh token for a new credential.
    ///
    /// On failure the caller has to start a fresh handshake.
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedCredential, AuthError> {
        let tokens = self.provider.refresh(refresh_token).await?;
        let credential = self.issue(tokens).await?;
        tracing::debug!("Refreshed credential for {}", credential.user.username);
        Ok(credential)
    }

    /// End the provider session behind `refresh_token`, if one was given.
    ///
    /// A refresh token the provider no longer knows already means logged out.
    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<(), AuthError> {
        let Some(refresh_token) = refresh_token else {
            return Ok(());
        };

        match self.provider.end_session(refresh_token).await {
            Ok(()) => Ok(()),
            Err(OidcError::Rejected(reason)) => {
                tracing::debug!("Provider had no session to end: {}", reason);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn user_info(&self, access_token: &str) -> Result<UserInfo, AuthError> {
        Ok(self.provider.user_info(access_token).await?)
    }

    async fn issue(&self, tokens: TokenSet) -> Result<IssuedCredential, AuthError> {
        let verified = self.verifier.verify(&tokens.access_token).await?;
        Ok(IssuedCredential::from_verified(tokens, verified, Utc::now()))
    }
}
