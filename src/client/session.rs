use serde::{Deserialize, Serialize};

use super::ClientError;

/// Where a single principal's session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Anonymous,
    PendingProviderRedirect,
    Authenticated,
    Refreshing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    HandshakeStarted,
    ProviderCallbackOk,
    /// Direct username/password exchange succeeded
    DirectExchangeOk,
    NearExpiry,
    RefreshSucceeded,
    RefreshFailed,
    /// Refresh hit an outage; keep the current credential and try again later
    RefreshDeferred,
    Logout,
    /// The server refused the credential
    Rejected,
}

/// Explicit session lifecycle.
///
/// ```text
/// Anonymous --HandshakeStarted--> PendingProviderRedirect --ProviderCallbackOk--> Authenticated
/// Anonymous --ProviderCallbackOk--> Authenticated   (login started by another process)
/// Anonymous | PendingProviderRedirect --DirectExchangeOk--> Authenticated
/// Authenticated --NearExpiry--> Refreshing --RefreshSucceeded | RefreshDeferred--> Authenticated
/// Refreshing --RefreshFailed--> Anonymous
/// any --Logout | Rejected--> Anonymous
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionMachine {
    state: SessionState,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new(SessionState::Anonymous)
    }
}

impl SessionMachine {
    pub fn new(state: SessionState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated | SessionState::Refreshing)
    }

    /// Apply `event`, or fail without changing state if it is not allowed here
    pub fn apply(&mut self, event: SessionEvent) -> Result<SessionState, ClientError> {
        use SessionEvent::*;
        use SessionState::*;

        let next = match (self.state, event) {
            (Anonymous | PendingProviderRedirect, HandshakeStarted) => PendingProviderRedirect,
            (Anonymous | PendingProviderRedirect, ProviderCallbackOk) => Authenticated,
            (Anonymous | PendingProviderRedirect | Authenticated, DirectExchangeOk) => Authenticated,
            (Authenticated, NearExpiry) => Refreshing,
            (Refreshing, RefreshSucceeded | RefreshDeferred) => Authenticated,
            (Refreshing, RefreshFailed) => Anonymous,
            (_, Logout) | (_, Rejected) => Anonymous,
            (from, event) => return Err(ClientError::InvalidTransition { from, event }),
        };

        tracing::debug!("Session {:?} --{:?}--> {:?}", self.state, event, next);
        self.state = next;
        Ok(next)
    }
}
