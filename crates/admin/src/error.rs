//! Unified error handling for admin.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::backend::ApiError;

/// Login page shown after the backend rejected the operator's token.
pub const SESSION_EXPIRED_REDIRECT: &str =
    "/auth/login?error=Your%20session%20has%20expired.%20Please%20log%20in%20again.";

/// Response extension telling the session middleware to end the session.
#[derive(Debug, Clone, Copy)]
pub struct EndSession;

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[source] ApiError),

    /// The backend rejected the bearer token.
    #[error("Session expired")]
    SessionExpired,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ApiError> for AppError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Unauthorized => Self::SessionExpired,
            ApiError::Api { status: 404, message } => {
                Self::NotFound(message.unwrap_or_else(|| "Resource not found".to_string()))
            }
            other => Self::Backend(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(self, Self::Backend(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        if matches!(self, Self::SessionExpired) {
            tracing::info!("Backend rejected token, ending session");
            let mut response = Redirect::to(SESSION_EXPIRED_REDIRECT).into_response();
            response.extensions_mut().insert(EndSession);
            return response;
        }

        let status = match &self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) | Self::SessionExpired => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Backend(e) => e.user_message(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Set the Sentry user context for the signed-in operator.
pub fn set_sentry_user(email: &str, id: Option<i64>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: id.map(|id| id.to_string()),
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order 123".to_string());
        assert_eq!(err.to_string(), "Not found: order 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::from(ApiError::Failed("Payment failed.".to_string()))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_backend_unauthorized_ends_session() {
        let err = AppError::from(ApiError::Unauthorized);
        assert!(matches!(err, AppError::SessionExpired));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(response.extensions().get::<EndSession>().is_some());
    }

    #[test]
    fn test_backend_not_found_maps_to_404() {
        let err = AppError::from(ApiError::Api {
            status: 404,
            message: None,
        });
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
