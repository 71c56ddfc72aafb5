//! Session-related types for operator authentication.

use secrecy::SecretString;

use tmc_core::{Identity, Role};

use crate::backend::{Authorized, BackendClient};

/// The signed-in operator for the current request.
///
/// Rebuilt from the stored token on every request; never stored itself.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub identity: Identity,
    token: SecretString,
}

impl CurrentUser {
    #[must_use]
    pub const fn new(identity: Identity, token: SecretString) -> Self {
        Self { identity, token }
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.identity.role
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.identity.display_name()
    }

    /// A backend client carrying this operator's bearer token.
    #[must_use]
    pub fn api(&self, backend: &BackendClient) -> Authorized {
        backend.authorized(self.token.clone())
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for the backend bearer token.
    pub const TOKEN: &str = "token";
}
