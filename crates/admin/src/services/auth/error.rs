//! Operator authentication error types.

use thiserror::Error;

use tmc_core::CredentialError;

use crate::backend::ApiError;

const LOGIN_FAILED: &str = "Login failed. Please try again.";

/// Errors that can occur while signing in, restoring or ending a session.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password left empty.
    #[error("email and password are required")]
    MissingFields,

    /// Backend refused or failed the login.
    #[error("backend error: {0}")]
    Backend(#[from] ApiError),

    /// The token the backend issued is malformed or already expired.
    #[error("unusable credential: {0}")]
    Credential(#[from] CredentialError),

    /// Session storage failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl AuthError {
    /// The message to show on the login page.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingFields => "Email and password are required.".to_string(),
            Self::Backend(e) => e.user_message(),
            Self::Credential(_) | Self::Session(_) => LOGIN_FAILED.to_string(),
        }
    }
}
