use thiserror::Error;

use crate::session::NotSignedIn;
use crate::store::StoreError;

/// Failure of a form action (auth, dashboard, products).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("not signed in")]
    NotSignedIn,

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<NotSignedIn> for ActionError {
    fn from(_: NotSignedIn) -> Self {
        ActionError::NotSignedIn
    }
}
