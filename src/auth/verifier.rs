use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};

use super::{AccessClaims, AuthError, Principal};
use crate::oidc::{IdentityProvider, OidcError};

/// Outcome of a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub principal: Principal,
    pub expires_at: DateTime<Utc>,
}

/// Checks access tokens against the provider's published signing keys.
///
/// Any result other than `Ok` means the token must not be honoured.
pub struct TokenVerifier {
    provider: Arc<dyn IdentityProvider>,
}

impl TokenVerifier {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    pub async fn verify(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::MalformedCredential(e.to_string()))?;

        let key = self
            .provider
            .signing_key(header.kid.as_deref(), header.alg)
            .await
            .map_err(|e| match e {
                // the token names a key or algorithm the provider does not vouch for
                OidcError::UnknownSigningKey(_) | OidcError::KeyMismatch(_) => AuthError::Invalid(e.to_string()),
                other => AuthError::Provider(other),
            })?;

        let mut validation = Validation::new(key.algorithm);
        validation.leeway = 0;
        validation.set_issuer(&[self.provider.issuer()]);
        match self.provider.audience() {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let claims = decode::<AccessClaims>(token, &key.key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(e.to_string()),
            })?
            .claims;

        // exp is exclusive: a token is dead at its expiry second
        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::Expired);
        }

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| AuthError::Invalid("exp out of range".to_string()))?;

        Ok(VerifiedToken {
            principal: Principal::from_claims(&claims),
            expires_at,
        })
    }
}
