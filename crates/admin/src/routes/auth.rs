//! Authentication route handlers for admin.
//!
//! Email and password login against the backend, logout, and the root
//! redirect into the operator's area.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::Flash;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", post(logout))
}

/// Send operators to their area, everyone else to login.
///
/// GET /
pub async fn root(OptionalAuth(user): OptionalAuth) -> Redirect {
    match user {
        Some(user) => Redirect::to(user.role().home_path()),
        None => Redirect::to("/auth/login"),
    }
}

/// Render the login page.
///
/// GET /auth/login
async fn login_page(OptionalAuth(user): OptionalAuth, Query(flash): Query<Flash>) -> Response {
    if let Some(user) = user {
        return Redirect::to(user.role().home_path()).into_response();
    }

    LoginTemplate {
        email: String::new(),
        error: flash.error,
        success: flash.success,
    }
    .into_response()
}

/// Sign in.
///
/// POST /auth/login
#[instrument(skip(state, session, form), fields(email = %form.email))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let password = SecretString::from(form.password);

    match AuthService::new(state.backend())
        .login(&session, &form.email, &password)
        .await
    {
        Ok(user) => Redirect::to(user.role().home_path()).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            LoginTemplate {
                email: form.email,
                error: Some(e.user_message()),
                success: None,
            }
            .into_response()
        }
    }
}

/// Logout and clear session.
///
/// POST /auth/logout
async fn logout(session: Session) -> Response {
    if let Err(e) = AuthService::logout(&session).await {
        tracing::error!(error = %e, "Failed to clear session on logout");
    }

    Redirect::to(&Flash::success("You have been logged out.").attach("/auth/login")).into_response()
}
