//! Authentication middleware and extractors for admin.
//!
//! Provides extractors for requiring a signed-in operator, optionally with a
//! specific role, in route handlers.

use std::marker::PhantomData;

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use tmc_core::Role;

use crate::error::{AppError, EndSession, clear_sentry_user};
use crate::models::CurrentUser;
use crate::services::auth::SessionStore;

/// Error returned when a route needs a signed-in operator.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (no session layer).
    Unauthorized,
    /// Signed in, but with the wrong role.
    Forbidden,
    /// The session store could not be read.
    SessionUnavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => {
                AppError::Unauthorized("No session available".to_string()).into_response()
            }
            Self::Forbidden => {
                AppError::Forbidden("You do not have access to this page".to_string()).into_response()
            }
            Self::SessionUnavailable => {
                AppError::Internal("Session store unavailable".to_string()).into_response()
            }
        }
    }
}

async fn current_user(parts: &Parts) -> Result<CurrentUser, AuthRejection> {
    // Get the session from extensions (set by SessionManagerLayer)
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::Unauthorized)?;

    SessionStore::new(session)
        .restore(Utc::now())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to read session");
            AuthRejection::SessionUnavailable
        })?
        .ok_or(AuthRejection::RedirectToLogin)
}

/// Extractor that optionally gets the signed-in operator.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await.ok()))
    }
}

/// A role a route area is restricted to.
pub trait RoleArea: Send + Sync + 'static {
    const ROLE: Role;
}

/// Routes under `/admin`.
pub struct AdminArea;

impl RoleArea for AdminArea {
    const ROLE: Role = Role::Admin;
}

/// Routes under `/konsulent`.
pub struct ConsultantArea;

impl RoleArea for ConsultantArea {
    const ROLE: Role = Role::Consultant;
}

/// Extractor that requires an operator with the area's role.
///
/// Not signed in redirects to login; the wrong role is 403 Forbidden.
pub struct RequireRole<A>(pub CurrentUser, pub PhantomData<A>);

/// Admin-only routes.
pub type RequireAdmin = RequireRole<AdminArea>;

/// Consultant-only routes.
pub type RequireConsultant = RequireRole<ConsultantArea>;

impl<S, A> FromRequestParts<S> for RequireRole<A>
where
    S: Send + Sync,
    A: RoleArea,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts).await?;
        if user.role() != A::ROLE {
            tracing::warn!(
                email = %user.identity.email,
                role = %user.role(),
                path = %parts.uri.path(),
                "Operator tried to open another role's page"
            );
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(user, PhantomData))
    }
}

/// End the session when a handler reports that the backend rejected the
/// operator's token.
pub async fn end_rejected_sessions(session: Session, request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    if response.extensions().get::<EndSession>().is_some() {
        if let Err(e) = SessionStore::new(&session).logout().await {
            tracing::error!(error = %e, "Failed to end rejected session");
        }
        clear_sentry_user();
    }

    response
}

#[cfg(test)]
mod tests {
    use axum::http::{StatusCode, header};

    use super::*;

    #[test]
    fn test_rejection_responses() {
        let response = AuthRejection::RedirectToLogin.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
            Some("/auth/login")
        );

        assert_eq!(
            AuthRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthRejection::SessionUnavailable.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
