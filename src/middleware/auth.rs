use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};

use crate::app::AppState;
use crate::auth::{AuthError, Principal, VerifiedToken};
use crate::error::ApiError;

/// Authenticated user context extracted from a verified bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub principal: Principal,
    pub expires_at: DateTime<Utc>,
    /// Raw credential, for calls made on the user's behalf
    pub access_token: String,
}

impl AuthUser {
    fn new(verified: VerifiedToken, access_token: String) -> Self {
        Self {
            principal: verified.principal,
            expires_at: verified.expires_at,
            access_token,
        }
    }
}

/// Gatekeeper for every `/api` route.
///
/// Admits a request only after its bearer token verifies against the
/// provider's keys; every other outcome is a rejection.
pub async fn require_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers).map_err(|e| {
        tracing::warn!("Rejected {} {}: {}", request.method(), request.uri().path(), e);
        ApiError::from(e)
    })?;

    let verified = state.auth.verifier().verify(&token).await.map_err(|e| {
        tracing::warn!("Rejected {} {}: {}", request.method(), request.uri().path(), e);
        ApiError::from(e)
    })?;

    tracing::debug!("Admitted {} for {}", request.uri().path(), verified.principal.username);
    request.extensions_mut().insert(AuthUser::new(verified, token));

    Ok(next.run(request).await)
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::MalformedCredential("Invalid Authorization header format".to_string()))?;

    let (scheme, token) = auth_str
        .split_once(' ')
        .ok_or_else(|| AuthError::MalformedCredential("Authorization header must use Bearer token format".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedCredential(
            "Authorization header must use Bearer token format".to_string(),
        ));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedCredential("Empty bearer token".to_string()));
    }
    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(extract_bearer_token(&headers("bearer abc")).unwrap(), "abc");
    }

    #[test]
    fn missing_header_is_missing_credential() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()).unwrap_err(), AuthError::MissingCredential);
    }

    #[test]
    fn other_schemes_are_malformed() {
        assert!(matches!(
            extract_bearer_token(&headers("Basic YWxpY2U6c2VjcmV0")),
            Err(AuthError::MalformedCredential(_))
        ));
        assert!(matches!(
            extract_bearer_token(&headers("Bearer   ")),
            Err(AuthError::MalformedCredential(_))
        ));
        assert!(matches!(
            extract_bearer_token(&headers("abc.def.ghi")),
            Err(AuthError::MalformedCredential(_))
        ));
    }
}
