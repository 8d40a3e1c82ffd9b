//! In-process identity provider for unit tests.
//!
//! Tokens are HS256-signed with a fixed secret and verified through the same
//! [`IdentityProvider::signing_key`] path a real provider's keys take.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use url::Url;
use uuid::Uuid;

use crate::oidc::{IdentityProvider, OidcError, SigningKey, TokenSet, UserInfo};

pub const ISSUER: &str = "https://idp.test/realms/edc";
pub const KID: &str = "unit-test-key";
pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "secret";
pub const SUBJECT: &str = "7d1f4a0e-alice";
pub const GOOD_CODE: &str = "valid-code";

const SECRET: &[u8] = b"unit-test-signing-secret";

pub struct TestProvider {
    pub access_lifetime: i64,
    pub refresh_lifetime: i64,
    pub code_exchanges: AtomicUsize,
    refresh_tokens: Mutex<HashMap<String, i64>>,
    last_exp: Mutex<i64>,
}

impl Default for TestProvider {
    fn default() -> Self {
        Self {
            access_lifetime: 300,
            refresh_lifetime: 1800,
            code_exchanges: AtomicUsize::new(0),
            refresh_tokens: Mutex::new(HashMap::new()),
            last_exp: Mutex::new(0),
        }
    }
}

impl TestProvider {
    /// Sign a token for `sub` expiring at `exp`
    pub fn mint(&self, sub: &str, username: &str, exp: i64) -> String {
        mint_with(ISSUER, KID, sub, username, exp)
    }

    fn issue(&self) -> TokenSet {
        let now = Utc::now().timestamp();
        let exp = {
            let mut last = self.last_exp.lock().unwrap();
            // successive tokens always expire strictly later
            *last = (now + self.access_lifetime).max(*last + 1);
            *last
        };

        let refresh_token = Uuid::new_v4().to_string();
        self.refresh_tokens
            .lock()
            .unwrap()
            .insert(refresh_token.clone(), now + self.refresh_lifetime);

        TokenSet {
            access_token: self.mint(SUBJECT, USERNAME, exp),
            token_type: "Bearer".into(),
            expires_in: Some(exp - now),
            refresh_token: Some(refresh_token),
            refresh_expires_in: Some(self.refresh_lifetime),
            id_token: None,
        }
    }
}

pub fn mint_with(issuer: &str, kid: &str, sub: &str, username: &str, exp: i64) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(kid.to_string());
    let claims = serde_json::json!({
        "sub": sub,
        "iss": issuer,
        "exp": exp,
        "iat": Utc::now().timestamp(),
        "preferred_username": username,
        "email": format!("{}@example.com", username),
        "realm_access": { "roles": ["edc-admin"] },
    });
    encode(&header, &claims, &EncodingKey::from_secret(SECRET)).unwrap()
}

#[async_trait]
impl IdentityProvider for TestProvider {
    fn issuer(&self) -> &str {
        ISSUER
    }

    fn audience(&self) -> Option<&str> {
        None
    }

    async fn authorization_url(&self, state: &str, pkce_challenge: &str) -> Result<Url, OidcError> {
        let mut url = Url::parse(&format!("{}/protocol/openid-connect/auth", ISSUER)).unwrap();
        url.query_pairs_mut()
            .append_pair("state", state)
            .append_pair("code_challenge", pkce_challenge);
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
        if username == USERNAME && password == PASSWORD {
            Ok(self.issue())
        } else {
            Err(OidcError::Rejected("invalid_grant: Invalid user credentials".into()))
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, OidcError> {
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
            email: Some(format!("{}@example.com", USERNAME)),
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
