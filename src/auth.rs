//! Sign-up, sign-in and sign-out against the auth provider.
//!
//! Each call validates its input, talks to the store and then updates the
//! caller's `SessionContext`.

use tracing::{info, warn};

use crate::error::ActionError;
use crate::model::Session;
use crate::session::SessionContext;
use crate::store::{AuthStore, FeedStore};
use crate::validation;

/// Header name used when the user has no profile row.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// Result of a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedIn {
    pub session: Session,
    pub display_name: String,
}

pub async fn sign_up<S: AuthStore + FeedStore>(
    store: &S,
    ctx: &mut SessionContext,
    full_name: &str,
    email: &str,
    password: &str,
) -> Result<SignedIn, ActionError> {
    let email = email.trim();
    validation::validate_full_name(full_name).map_err(ActionError::Invalid)?;
    validation::validate_email(email).map_err(ActionError::Invalid)?;
    validation::validate_password(password).map_err(ActionError::Invalid)?;

    let session = store.sign_up(full_name.trim(), email, password).await?;
    Ok(establish(store, ctx, session).await)
}

pub async fn sign_in<S: AuthStore + FeedStore>(
    store: &S,
    ctx: &mut SessionContext,
    email: &str,
    password: &str,
) -> Result<SignedIn, ActionError> {
    let email = email.trim();
    validation::validate_email(email).map_err(ActionError::Invalid)?;
    if password.is_empty() {
        return Err(ActionError::Invalid("Password cannot be empty".into()));
    }

    let session = store.sign_in(email, password).await?;
    Ok(establish(store, ctx, session).await)
}

/// Resume a session from a remembered access token.
pub async fn restore<S: AuthStore + FeedStore>(
    store: &S,
    ctx: &mut SessionContext,
    access_token: &str,
) -> Result<SignedIn, ActionError> {
    let session = store.restore_session(access_token).await?;
    Ok(establish(store, ctx, session).await)
}

/// Clear the context and revoke the token. The context is cleared even when
/// the store call fails.
pub async fn sign_out<S: AuthStore>(store: &S, ctx: &mut SessionContext) -> Option<Session> {
    let session = ctx.sign_out()?;
    if let Err(e) = store.sign_out(&session).await {
        warn!(event = "auth.sign_out_failed", error = %e);
    }
    info!(event = "auth.signed_out", user_id = %session.user_id);
    Some(session)
}

/// Full name from the user's profile, or the default header name.
pub async fn display_name_for<S: FeedStore>(store: &S, user_id: &str) -> String {
    match store.fetch_profile(user_id).await {
        Ok(Some(profile)) => profile.full_name,
        Ok(None) => DEFAULT_DISPLAY_NAME.to_string(),
        Err(e) => {
            warn!(event = "auth.profile_lookup_failed", error = %e);
            DEFAULT_DISPLAY_NAME.to_string()
        }
    }
}

async fn establish<S: FeedStore>(store: &S, ctx: &mut SessionContext, session: Session) -> SignedIn {
    let display_name = display_name_for(store, &session.user_id).await;
    info!(event = "auth.signed_in", user_id = %session.user_id);
    ctx.sign_in(session.clone());
    SignedIn {
        session,
        display_name,
    }
}
