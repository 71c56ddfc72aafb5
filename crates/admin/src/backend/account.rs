//! `PUT /api/account/password`.

use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use super::types::PasswordChangeRequest;
use super::{ApiError, Authorized};

const PASSWORD_PATH: &str = "/api/account/password";

impl Authorized {
    /// Change the signed-in operator's password.
    ///
    /// # Errors
    ///
    /// Returns the backend's reason, or "Failed to update password".
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        current: &SecretString,
        new: &SecretString,
    ) -> Result<(), ApiError> {
        let body = PasswordChangeRequest {
            current_password: current.expose_secret(),
            new_password: new.expose_secret(),
        };

        self.put_empty(PASSWORD_PATH, &body)
            .await
            .map_err(|e| e.or_fallback("Failed to update password"))
    }
}
