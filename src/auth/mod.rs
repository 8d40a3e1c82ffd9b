//! Credential issuance and verification.
//!
//! Everything here talks to the identity provider through the
//! [`IdentityProvider`](crate::oidc::IdentityProvider) seam; nothing signs
//! tokens locally.

pub mod authenticator;
pub mod claims;
pub mod credential;
pub mod error;
pub mod handshake;
pub mod verifier;

pub use authenticator::Authenticator;
pub use claims::{AccessClaims, Principal, RealmAccess};
pub use credential::{IssuedCredential, SessionInfo};
pub use error::{AuthError, HandshakeError};
pub use handshake::{AuthorizationRequest, HandshakeRegistry, Pkce};
pub use verifier::{TokenVerifier, VerifiedToken};
