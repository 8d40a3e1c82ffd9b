use thiserror::Error;

use crate::oidc::OidcError;

/// Why a credential was not accepted or could not be obtained
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no credential presented")]
    MissingCredential,

    #[error("malformed credential: {0}")]
    MalformedCredential(String),

    #[error("credential has expired")]
    Expired,

    #[error("credential rejected: {0}")]
    Invalid(String),

    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    #[error(transparent)]
    Provider(#[from] OidcError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// Anti-forgery value unknown, already used, or forged
    #[error("unknown or already used login state")]
    UnknownState,

    #[error("login attempt has expired")]
    Expired,

    /// The provider redirected back with an `error` parameter
    #[error("identity provider denied the login: {0}")]
    ProviderDenied(String),

    /// Too many logins are pending at once
    #[error("too many pending logins")]
    Saturated,
}
