//! REST client for the order-management backend.
//!
//! One module per resource. Every call returns a typed result; non-2xx
//! responses become [`ApiError`] carrying the backend's own message when the
//! body has one (`message`, then `error`), otherwise a per-operation fallback.
//!
//! # Endpoints
//!
//! - `POST /api/auth/login` - exchange email/password for a bearer token
//! - `PUT /api/account/password` - change the signed-in operator's password
//! - `/api/person/...` - customers and consultants
//! - `/api/orders/...` - orders, email check, payments, refunds, status
//!
//! No caching and no retries: a failed call is reported once and the
//! operator decides what to do.

mod account;
mod auth;
mod conversions;
mod orders;
mod persons;
mod types;

pub use orders::{OrderApi, OrderDraft};
pub use persons::{NewPerson, PersonApi, PersonKind};

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::BackendConfig;

/// Message used when the backend gives no reason and the call has no
/// operation-specific fallback.
pub const DEFAULT_FAILURE: &str = "Request failed";

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never got a response.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API error: {status} - {}", .message.as_deref().unwrap_or(DEFAULT_FAILURE))]
    Api {
        status: u16,
        /// Reason from the response body, or an operation fallback.
        message: Option<String>,
    },

    /// The request conflicts with the resource's current state (409).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The operation failed and only a fixed message is reported.
    #[error("{0}")]
    Failed(String),

    /// The bearer token was rejected; the operator must sign in again.
    #[error("Unauthorized: session expired")]
    Unauthorized,

    /// Login was refused for the given email and password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A success response could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Fill in an operation-specific message when the backend gave none.
    #[must_use]
    pub fn or_fallback(self, fallback: &str) -> Self {
        match self {
            Self::Api {
                status,
                message: None,
            } => Self::Api {
                status,
                message: Some(fallback.to_string()),
            },
            other => other,
        }
    }

    /// The message to show the operator.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(_) => "Could not reach the server. Please try again.".to_string(),
            Self::Api { message, .. } => message
                .clone()
                .unwrap_or_else(|| DEFAULT_FAILURE.to_string()),
            Self::Conflict(message) | Self::Failed(message) => message.clone(),
            Self::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            Self::InvalidCredentials => "Invalid credentials.".to_string(),
            Self::Parse(_) => "Unexpected response from the server.".to_string(),
        }
    }

    /// HTTP status the backend answered with, if it answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Conflict(_) => Some(409),
            Self::Unauthorized | Self::InvalidCredentials => Some(401),
            _ => None,
        }
    }
}

/// Error body shape used by the backend.
#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    message: Option<String>,
    error: Option<String>,
}

impl ErrorPayload {
    fn into_message(self) -> Option<String> {
        [self.message, self.error]
            .into_iter()
            .flatten()
            .map(|m| m.trim().to_string())
            .find(|m| !m.is_empty())
    }
}

/// Backend API client.
///
/// Cheap to clone. Unauthenticated calls (login) go through this type;
/// everything else goes through [`Authorized`].
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// The configured backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Attach a bearer token for authenticated calls.
    #[must_use]
    pub fn authorized(&self, token: SecretString) -> Authorized {
        Authorized {
            client: self.clone(),
            token,
        }
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| ApiError::Parse(format!("Invalid URL path {path}: {e}")))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> Result<reqwest::RequestBuilder, ApiError> {
        Ok(self.inner.client.request(method, self.url(path)?))
    }
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// A backend client bound to one operator's bearer token.
#[derive(Clone)]
pub struct Authorized {
    client: BackendClient,
    token: SecretString,
}

impl Authorized {
    fn request(&self, method: reqwest::Method, path: &str) -> Result<reqwest::RequestBuilder, ApiError> {
        Ok(self
            .client
            .request(method, path)?
            .bearer_auth(self.token.expose_secret()))
    }

    /// Execute a GET request.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(reqwest::Method::GET, path)?.send().await?;
        handle_response(response).await
    }

    /// Execute a GET request with query parameters, returning the raw response.
    pub(crate) async fn get_raw(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, ApiError> {
        Ok(self
            .request(reqwest::Method::GET, path)?
            .query(query)
            .send()
            .await?)
    }

    /// Execute a POST request.
    pub(crate) async fn post<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .request(reqwest::Method::POST, path)?
            .json(body)
            .send()
            .await?;
        handle_response(response).await
    }

    /// Execute a POST request whose response body is ignored.
    pub(crate) async fn post_empty<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let response = self
            .request(reqwest::Method::POST, path)?
            .json(body)
            .send()
            .await?;
        handle_empty(response).await
    }

    /// Execute a PUT request.
    pub(crate) async fn put<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .request(reqwest::Method::PUT, path)?
            .json(body)
            .send()
            .await?;
        handle_response(response).await
    }

    /// Execute a PUT request whose response body is ignored.
    pub(crate) async fn put_empty<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let response = self
            .request(reqwest::Method::PUT, path)?
            .json(body)
            .send()
            .await?;
        handle_empty(response).await
    }

    /// Execute a DELETE request.
    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let response = self.request(reqwest::Method::DELETE, path)?.send().await?;
        handle_empty(response).await
    }
}

impl std::fmt::Debug for Authorized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorized")
            .field("client", &self.client)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Handle API response and parse JSON.
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    if response.status().is_success() {
        return response
            .json()
            .await
            .map_err(|e| ApiError::Parse(format!("Failed to parse response: {e}")));
    }

    Err(parse_error(response).await)
}

/// Handle an API response whose body carries nothing we need.
async fn handle_empty(response: reqwest::Response) -> Result<(), ApiError> {
    if response.status().is_success() {
        return Ok(());
    }

    Err(parse_error(response).await)
}

/// Parse error response from the backend.
async fn parse_error(response: reqwest::Response) -> ApiError {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        return ApiError::Unauthorized;
    }

    let message = response
        .json::<ErrorPayload>()
        .await
        .ok()
        .and_then(ErrorPayload::into_message);

    ApiError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_payload_prefers_message() {
        let payload = ErrorPayload {
            message: Some("Customer has existing orders".to_string()),
            error: Some("Conflict".to_string()),
        };
        assert_eq!(
            payload.into_message().as_deref(),
            Some("Customer has existing orders")
        );

        let payload = ErrorPayload {
            message: Some("  ".to_string()),
            error: Some("Bad Request".to_string()),
        };
        assert_eq!(payload.into_message().as_deref(), Some("Bad Request"));
        assert_eq!(ErrorPayload::default().into_message(), None);
    }

    #[test]
    fn test_or_fallback_only_fills_missing_message() {
        let err = ApiError::Api {
            status: 500,
            message: None,
        }
        .or_fallback("Failed to create customer");
        assert_eq!(err.user_message(), "Failed to create customer");

        let err = ApiError::Api {
            status: 400,
            message: Some("Email already in use".to_string()),
        }
        .or_fallback("Failed to create customer");
        assert_eq!(err.user_message(), "Email already in use");

        let err = ApiError::Unauthorized.or_fallback("ignored");
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn test_status() {
        assert_eq!(ApiError::Conflict(String::new()).status(), Some(409));
        assert_eq!(ApiError::Parse(String::new()).status(), None);
    }

    #[test]
    fn test_url_join() {
        let config = BackendConfig::new(Url::parse("http://backend.local:8080").unwrap());
        let client = BackendClient::new(&config).unwrap();
        let url = client.url("/api/orders/7").unwrap();
        assert_eq!(url.as_str(), "http://backend.local:8080/api/orders/7");
    }
}
