use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OidcError {
    #[error("identity provider is not configured: {0}")]
    Configuration(String),

    /// The provider refused the grant, code or token
    #[error("identity provider rejected the request: {0}")]
    Rejected(String),

    /// Timeout, broken transfer or 5xx; the provider may have seen the request
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),

    /// No connection was made, so the request never reached the provider
    #[error("identity provider unreachable: {0}")]
    Unreachable(String),

    #[error("unexpected identity provider response: {0}")]
    InvalidResponse(String),

    #[error("no signing key for kid {0:?}")]
    UnknownSigningKey(Option<String>),

    #[error("signing key does not permit {0}")]
    KeyMismatch(String),
}

impl OidcError {
    pub fn is_transient(&self) -> bool {
        matches!(self, OidcError::Unavailable(_) | OidcError::Unreachable(_))
    }

    /// Transient, and certain the provider did not act on the request
    pub fn is_unreachable(&self) -> bool {
        matches!(self, OidcError::Unreachable(_))
    }
}

impl From<ConfigError> for OidcError {
    fn from(err: ConfigError) -> Self {
        OidcError::Configuration(err.to_string())
    }
}

impl From<reqwest::Error> for OidcError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            OidcError::InvalidResponse(err.to_string())
        } else if err.is_connect() {
            OidcError::Unreachable(err.to_string())
        } else {
            // timeouts, refused connections, broken transfers
            OidcError::Unavailable(err.to_string())
        }
    }
}
