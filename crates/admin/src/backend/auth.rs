//! `POST /api/auth/login`.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use super::types::{LoginRequest, LoginResponse};
use super::{ApiError, BackendClient};

const LOGIN_PATH: &str = "/api/auth/login";

impl BackendClient {
    /// Exchange email and password for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidCredentials`] on 401 and a generic
    /// "Login failed" error for every other failure.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<SecretString, ApiError> {
        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };

        let response = self
            .request(reqwest::Method::POST, LOGIN_PATH)?
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Login request failed");
                login_failed()
            })?;

        match response.status() {
            status if status.is_success() => {
                let payload: LoginResponse = response
                    .json()
                    .await
                    .map_err(|e| ApiError::Parse(format!("Failed to parse login response: {e}")))?;
                Ok(SecretString::from(payload.token))
            }
            StatusCode::UNAUTHORIZED => Err(ApiError::InvalidCredentials),
            status => {
                tracing::warn!(status = status.as_u16(), "Login rejected");
                Err(login_failed())
            }
        }
    }
}

fn login_failed() -> ApiError {
    ApiError::Failed("Login failed. Please try again.".to_string())
}
