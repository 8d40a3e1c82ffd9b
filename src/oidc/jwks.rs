use std::future::Future;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::RwLock;

use super::OidcError;

/// Keys that fail to match are not refetched more often than this
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(10);

/// A verified-usable key plus the algorithm it may verify
#[derive(Clone)]
pub struct SigningKey {
    pub key: DecodingKey,
    pub algorithm: Algorithm,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey").field("algorithm", &self.algorithm).finish()
    }
}

/// Read-mostly cache of the provider's published key set.
///
/// Entries are served until `ttl` elapses. A miss (or an unknown `kid`, which
/// usually means the provider rotated keys) triggers a fetch, rate limited to
/// one per [`MIN_REFETCH_INTERVAL`].
#[derive(Debug)]
pub struct KeyCache {
    ttl: Duration,
    min_refetch: Duration,
    state: RwLock<Option<CachedKeys>>,
}

#[derive(Debug)]
struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

impl KeyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            min_refetch: MIN_REFETCH_INTERVAL.min(ttl),
            state: RwLock::new(None),
        }
    }

    /// Look up the key for `kid`, fetching the key set with `fetch` if needed
    pub async fn find<F, Fut>(&self, kid: Option<&str>, fetch: F) -> Result<Jwk, OidcError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<JwkSet, OidcError>>,
    {
        {
            let guard = self.state.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.fetched_at.elapsed() < self.ttl {
                    if let Some(jwk) = select_key(&cached.keys, kid) {
                        return Ok(jwk.clone());
                    }
                }
            }
        }

        let mut guard = self.state.write().await;

        // Another request may have refreshed while we waited for the lock
        if let Some(cached) = guard.as_ref() {
            let age = cached.fetched_at.elapsed();
            if age < self.ttl {
                if let Some(jwk) = select_key(&cached.keys, kid) {
                    return Ok(jwk.clone());
                }
                if age < self.min_refetch {
                    return Err(OidcError::UnknownSigningKey(kid.map(str::to_string)));
                }
            }
        }

        let keys = fetch().await?;
        tracing::debug!("Fetched {} signing keys from identity provider", keys.keys.len());
        let found = select_key(&keys, kid).cloned();
        *guard = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });

        found.ok_or_else(|| OidcError::UnknownSigningKey(kid.map(str::to_string)))
    }
}

fn select_key<'a>(keys: &'a JwkSet, kid: Option<&str>) -> Option<&'a Jwk> {
    let jwk = match kid {
        Some(kid) => keys.find(kid),
        // Without a kid we only accept an unambiguous set
        None if keys.keys.len() == 1 => keys.keys.first(),
        None => None,
    }?;

    match jwk.common.public_key_use {
        Some(PublicKeyUse::Encryption) => None,
        _ => Some(jwk),
    }
}

/// Build a decoding key from `jwk`, refusing algorithms the key type cannot
/// legitimately sign with. Symmetric keys are never accepted from a key set.
pub fn signing_key_from_jwk(jwk: &Jwk, alg: Algorithm) -> Result<SigningKey, OidcError> {
    let permitted = match &jwk.algorithm {
        AlgorithmParameters::RSA(_) => matches!(
            alg,
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 | Algorithm::PS256 | Algorithm::PS384 | Algorithm::PS512
        ),
        AlgorithmParameters::EllipticCurve(_) => matches!(alg, Algorithm::ES256 | Algorithm::ES384),
        AlgorithmParameters::OctetKeyPair(_) => matches!(alg, Algorithm::EdDSA),
        AlgorithmParameters::OctetKey(_) => false,
    };
    if !permitted {
        return Err(OidcError::KeyMismatch(format!("{:?}", alg)));
    }

    let key = DecodingKey::from_jwk(jwk)
        .map_err(|e| OidcError::InvalidResponse(format!("unusable signing key: {}", e)))?;

    Ok(SigningKey { key, algorithm: alg })
}
