//! Current-user identity, passed explicitly to everything that writes.
//!
//! `SessionContext` is set on a successful sign-in/sign-up and cleared on
//! sign-out. Remembered access tokens live in the OS keyring.

use thiserror::Error;

use crate::model::Session;

const KEYRING_SERVICE: &str = "mess-client";

/// An operation needed an identity and none was set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("not signed in")]
pub struct NotSignedIn;

#[derive(Debug, Default)]
pub struct SessionContext {
    current: Option<Session>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&mut self, session: Session) {
        self.current = Some(session);
    }

    /// Clear the identity, returning the session that was active.
    pub fn sign_out(&mut self) -> Option<Session> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }

    /// The active session, or `NotSignedIn` for operations that need one.
    pub fn require(&self) -> Result<&Session, NotSignedIn> {
        self.current.as_ref().ok_or(NotSignedIn)
    }
}

/// Store an access token in the OS keyring under the account email.
pub fn save_session_token(email: &str, token: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, email)
        .map_err(|e| format!("Failed to open keyring entry: {}", e))?;
    entry
        .set_password(token)
        .map_err(|e| format!("Failed to store session token: {}", e))
}

/// Load a remembered access token, if any.
pub fn load_session_token(email: &str) -> Option<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, email).ok()?;
    entry.get_password().ok()
}

/// Forget the remembered token for this account.
pub fn clear_session_token(email: &str) {
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, email) {
        // NoEntry is fine: nothing was remembered
        let _ = entry.delete_password();
    }
}
