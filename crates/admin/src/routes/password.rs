//! Password change for consultants.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::instrument;

use tmc_core::validation::{PasswordChangeInput, validate_password_change};

use super::{Flash, LayoutView, inline_failure, redirect_with, render, render_invalid};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireConsultant, RequireRole};
use crate::state::AppState;

const PATH: &str = "/konsulent/password";

/// Build the password router.
pub fn router() -> Router<AppState> {
    Router::new().route(PATH, get(form).post(change))
}

/// Password change template.
#[derive(Template)]
#[template(path = "password.html")]
pub struct PasswordTemplate {
    pub layout: LayoutView,
    pub flash: Flash,
}

/// Posted password change.
#[derive(Debug, Default, Deserialize)]
pub struct PasswordForm {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// GET /konsulent/password
pub async fn form(RequireRole(user, _): RequireConsultant, Query(flash): Query<Flash>) -> Response {
    let template = PasswordTemplate {
        layout: LayoutView::new(&user, PATH),
        flash,
    };
    render(&template).into_response()
}

/// POST /konsulent/password
#[instrument(skip_all)]
pub async fn change(
    RequireRole(user, _): RequireConsultant,
    State(state): State<AppState>,
    Form(form): Form<PasswordForm>,
) -> Result<Response, AppError> {
    let input = PasswordChangeInput {
        current: form.current_password,
        new: form.new_password,
        confirm: form.confirm_password,
    };

    let mut template = PasswordTemplate {
        layout: LayoutView::new(&user, PATH),
        flash: Flash::default(),
    };

    if let Err(message) = validate_password_change(&input) {
        template.flash = Flash::error(message);
        return Ok(render_invalid(&template));
    }

    let current = SecretString::from(input.current);
    let new = SecretString::from(input.new);
    match user.api(state.backend()).change_password(&current, &new).await {
        Ok(()) => {
            tracing::info!("Password changed");
            Ok(redirect_with(PATH, &Flash::success("Password updated successfully.")))
        }
        Err(e) => {
            template.flash = Flash::error(inline_failure(&e)?);
            Ok(render_invalid(&template))
        }
    }
}
