//! Operator authentication service.
//!
//! Email and password go to the backend once; the bearer token it returns is
//! kept in the session and decoded on every request. No password is ever
//! stored.

mod error;
mod session;

pub use error::AuthError;
pub use session::SessionStore;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::BackendClient;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::CurrentUser;

/// Operator authentication service.
pub struct AuthService<'a> {
    backend: &'a BackendClient,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(backend: &'a BackendClient) -> Self {
        Self { backend }
    }

    /// Sign in with email and password and remember the issued token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingFields`] for empty input, the backend's
    /// login error, or [`AuthError::Credential`] when the issued token is
    /// unusable.
    #[instrument(skip(self, password, session))]
    pub async fn login(
        &self,
        session: &Session,
        email: &str,
        password: &SecretString,
    ) -> Result<CurrentUser, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.expose_secret().is_empty() {
            return Err(AuthError::MissingFields);
        }

        let token = self.backend.login(email, password).await?;
        let user = SessionStore::new(session).login(token, Utc::now()).await?;

        set_sentry_user(&user.identity.email, user.identity.id.map(Into::into));
        tracing::info!(email = %user.identity.email, role = %user.role(), "Operator signed in");
        Ok(user)
    }

    /// End the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn logout(session: &Session) -> Result<(), AuthError> {
        SessionStore::new(session).logout().await?;
        clear_sentry_user();
        Ok(())
    }
}
