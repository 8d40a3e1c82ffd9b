use thiserror::Error;

use super::session::{SessionEvent, SessionState};

#[derive(Debug, Error)]
pub enum ClientError {
    /// The stored credential is gone or unusable; log in again
    #[error("authentication required: {0}")]
    ReauthenticationRequired(String),

    /// The server answered with an error body
    #[error("{message} ({status})")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("credential storage: {0}")]
    Storage(#[from] std::io::Error),

    #[error("credential storage: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("session cannot go from {from:?} on {event:?}")]
    InvalidTransition { from: SessionState, event: SessionEvent },
}

impl ClientError {
    pub fn is_reauthentication_required(&self) -> bool {
        matches!(self, ClientError::ReauthenticationRequired(_))
    }

    /// Network trouble or a 5xx; the credential may still be good
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(_) => true,
            ClientError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
