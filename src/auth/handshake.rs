use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::{thread_rng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{AuthError, HandshakeError};
use crate::oidc::{IdentityProvider, TokenSet};

/// PKCE verifier and its S256 challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    pub fn generate() -> Self {
        Self::from_verifier(random_token())
    }

    pub fn from_verifier(verifier: String) -> Self {
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self { verifier, challenge }
    }
}

/// Where to send the user to start a redirect login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub authorization_url: String,
    pub state: String,
    pub expires_in: u64,
}

/// Pending logins allowed at once unless configured otherwise
pub const DEFAULT_MAX_PENDING: usize = 10_000;

#[derive(Debug)]
struct PendingHandshake {
    pkce_verifier: String,
    started_at: Instant,
}

/// Pending redirect logins, keyed by their single-use anti-forgery state.
///
/// Entries leave the registry on their first completion attempt, whatever the
/// outcome. Abandoned entries are pruned when later logins begin. At most
/// `max_pending` logins are tracked; further ones are refused until some
/// complete or expire.
pub struct HandshakeRegistry {
    provider: Arc<dyn IdentityProvider>,
    ttl: Duration,
    max_pending: usize,
    pending: Mutex<HashMap<String, PendingHandshake>>,
}

impl HandshakeRegistry {
    pub fn new(provider: Arc<dyn IdentityProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            max_pending: DEFAULT_MAX_PENDING,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }

    pub async fn begin(&self) -> Result<AuthorizationRequest, AuthError> {
        self.prune_and_check_capacity()?;

        let state = random_token();
        let pkce = Pkce::generate();

        let url = self.provider.authorization_url(&state, &pkce.challenge).await?;

        {
            let mut pending = self.lock();
            // re-checked: other logins may have started during the provider call
            if pending.len() >= self.max_pending {
                return Err(HandshakeError::Saturated.into());
            }
            pending.insert(
                state.clone(),
                PendingHandshake {
                    pkce_verifier: pkce.verifier,
                    started_at: Instant::now(),
                },
            );
            tracing::debug!("Login handshake started ({} pending)", pending.len());
        }

        Ok(AuthorizationRequest {
            authorization_url: url.to_string(),
            state,
            expires_in: self.ttl.as_secs(),
        })
    }

    /// Exchange `code` for tokens if `state` names a live pending login.
    ///
    /// The state is checked before the provider is contacted.
    pub async fn complete(&self, state: &str, code: &str) -> Result<TokenSet, AuthError> {
        let entry = self.take(state)?;
        let tokens = self.provider.exchange_code(code, &entry.pkce_verifier).await?;
        Ok(tokens)
    }

    /// Drop the pending login after the provider reported `error`
    pub fn abandon(&self, state: &str, error: &str) -> HandshakeError {
        if self.lock().remove(state).is_some() {
            tracing::info!("Login handshake abandoned by provider: {}", error);
        }
        HandshakeError::ProviderDenied(error.to_string())
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    fn prune_and_check_capacity(&self) -> Result<(), HandshakeError> {
        let mut pending = self.lock();
        let ttl = self.ttl;
        pending.retain(|_, entry| entry.started_at.elapsed() < ttl);
        if pending.len() >= self.max_pending {
            tracing::warn!("Refusing login: {} handshakes already pending", pending.len());
            return Err(HandshakeError::Saturated);
        }
        Ok(())
    }

    fn take(&self, state: &str) -> Result<PendingHandshake, HandshakeError> {
        let entry = self.lock().remove(state).ok_or_else(|| {
            tracing::warn!("Login callback with unknown or reused state");
            HandshakeError::UnknownState
        })?;

        if entry.started_at.elapsed() >= self.ttl {
            tracing::warn!("Login callback after handshake expiry");
            return Err(HandshakeError::Expired);
        }
        Ok(entry)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PendingHandshake>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 32 random bytes, base64url without padding
fn random_token() -> String {
    let mut bytes = [0u8; 32];
    thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
