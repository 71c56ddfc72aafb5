//! Persisted operator credential.
//!
//! The bearer token is the only thing kept in the session, under
//! [`session_keys::TOKEN`]. The identity is decoded from it on every
//! request, so an expired token stops authenticating as soon as its `exp`
//! passes and is removed by the request that notices.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tower_sessions::Session;

use tmc_core::Identity;

use super::AuthError;
use crate::models::{CurrentUser, session_keys};

/// Login, logout and restore over one request's session.
pub struct SessionStore<'a> {
    session: &'a Session,
}

impl<'a> SessionStore<'a> {
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Rebuild the operator from the stored token.
    ///
    /// A malformed or expired token is removed and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session store fails.
    pub async fn restore(&self, now: DateTime<Utc>) -> Result<Option<CurrentUser>, AuthError> {
        let Some(token) = self.session.get::<String>(session_keys::TOKEN).await? else {
            return Ok(None);
        };

        match Identity::from_token(&token, now) {
            Ok(identity) => Ok(Some(CurrentUser::new(identity, SecretString::from(token)))),
            Err(e) => {
                tracing::info!(error = %e, "Discarding stored credential");
                self.session.remove::<String>(session_keys::TOKEN).await?;
                Ok(None)
            }
        }
    }

    /// Store a freshly issued token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Credential`] for a malformed or expired token,
    /// after clearing any previously stored one.
    pub async fn login(&self, token: SecretString, now: DateTime<Utc>) -> Result<CurrentUser, AuthError> {
        let identity = match Identity::from_token(token.expose_secret(), now) {
            Ok(identity) => identity,
            Err(e) => {
                self.session.remove::<String>(session_keys::TOKEN).await?;
                return Err(e.into());
            }
        };

        if let Some(raw) = &identity.unrecognized_role {
            tracing::warn!(role = %raw, email = %identity.email, "Unrecognized role claim, treating as konsulent");
        }

        self.session.cycle_id().await?;
        self.session
            .insert(session_keys::TOKEN, token.expose_secret())
            .await?;

        Ok(CurrentUser::new(identity, token))
    }

    /// Forget the token and the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.session.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::TimeZone;
    use tower_sessions::MemoryStore;

    use tmc_core::Role;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn token(role: &str, exp: i64) -> SecretString {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#);
        let body = URL_SAFE_NO_PAD.encode(
            serde_json::json!({"sub": "ola@example.no", "role": role, "id": 4, "exp": exp})
                .to_string(),
        );
        SecretString::from(format!("{header}.{body}.sig"))
    }

    #[tokio::test]
    async fn test_login_then_restore() {
        let session = session();
        let store = SessionStore::new(&session);
        let exp = now().timestamp() + 3600;

        let user = store.login(token("admin", exp), now()).await.unwrap();
        assert_eq!(user.role(), Role::Admin);

        let restored = store.restore(now()).await.unwrap().unwrap();
        assert_eq!(restored.identity.email, "ola@example.no");
        assert_eq!(restored.display_name(), "ola");
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected_and_not_stored() {
        let session = session();
        let store = SessionStore::new(&session);
        let exp = now().timestamp() - 1;

        let err = store.login(token("admin", exp), now()).await.unwrap_err();
        assert!(matches!(err, AuthError::Credential(_)));
        assert!(store.restore(now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_discards_token_once_expired() {
        let session = session();
        let store = SessionStore::new(&session);
        let exp = now().timestamp() + 60;
        store.login(token("konsulent", exp), now()).await.unwrap();

        let later = now() + chrono::Duration::seconds(61);
        assert!(store.restore(later).await.unwrap().is_none());
        assert!(
            session
                .get::<String>(session_keys::TOKEN)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_malformed_stored_token_is_discarded() {
        let session = session();
        session.insert(session_keys::TOKEN, "not-a-jwt").await.unwrap();

        let store = SessionStore::new(&session);
        assert!(store.restore(now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_role_becomes_consultant() {
        let session = session();
        let store = SessionStore::new(&session);
        let exp = now().timestamp() + 3600;

        let user = store.login(token("superuser", exp), now()).await.unwrap();
        assert_eq!(user.role(), Role::Consultant);
        assert_eq!(user.identity.unrecognized_role.as_deref(), Some("superuser"));
    }

    #[tokio::test]
    async fn test_logout_clears_token() {
        let session = session();
        let store = SessionStore::new(&session);
        let exp = now().timestamp() + 3600;
        store.login(token("admin", exp), now()).await.unwrap();

        store.logout().await.unwrap();
        assert!(store.restore(now()).await.unwrap().is_none());
    }
}
