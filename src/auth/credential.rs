use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{Principal, VerifiedToken};
use crate::oidc::TokenSet;

/// Credential handed to a client after a handshake or refresh.
///
/// Only ever built from an access token that passed verification, so a
/// client never holds something the gatekeeper would refuse on arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCredential {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_expires_at: Option<DateTime<Utc>>,
    pub user: Principal,
}

impl IssuedCredential {
    pub fn from_verified(tokens: TokenSet, verified: VerifiedToken, now: DateTime<Utc>) -> Self {
        // Keycloak reports 0 for offline tokens, which do not expire
        let refresh_expires_at = match tokens.refresh_expires_in {
            Some(secs) if secs > 0 && tokens.refresh_token.is_some() => Some(now + Duration::seconds(secs)),
            _ => None,
        };

        Self {
            access_token: tokens.access_token,
            token_type: "Bearer".to_string(),
            expires_in: (verified.expires_at - now).num_seconds().max(0),
            expires_at: verified.expires_at,
            refresh_token: tokens.refresh_token,
            refresh_expires_at,
            user: verified.principal,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// True when the access token expires within `margin` of `now`
    pub fn expires_within(&self, margin: Duration, now: DateTime<Utc>) -> bool {
        self.expires_at - margin <= now
    }

    /// Whether a refresh can still be attempted at `now`
    pub fn can_refresh(&self, now: DateTime<Utc>) -> bool {
        match (&self.refresh_token, self.refresh_expires_at) {
            (None, _) => false,
            (Some(_), Some(deadline)) => deadline > now,
            (Some(_), None) => true,
        }
    }
}

/// Principal behind a presented credential, as reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub user: Principal,
    pub expires_at: DateTime<Utc>,
    pub expires_in: i64,
}
