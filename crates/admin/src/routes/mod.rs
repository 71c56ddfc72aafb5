//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                - Redirect to the operator's area or login
//!
//! # Auth
//! GET  /auth/login                      - Login page
//! POST /auth/login                      - Sign in with email and password
//! POST /auth/logout                     - Logout
//!
//! # Admin area (admin only)
//! GET  /admin                           - Dashboard
//! /admin/customers[...]                 - Customer management
//! /admin/konsulent[...]                 - Consultant management
//!
//! # Consultant area (konsulent only)
//! GET  /konsulent                       - Dashboard
//! /konsulent/customers[...]             - Customer management
//! /konsulent/orders[...]                - Order management
//! GET  /konsulent/password              - Password change form
//! POST /konsulent/password              - Change password
//!
//! # Resource sub-routes
//! GET  {base}                           - List (search, filter, sort, page)
//! GET  {base}/new, POST {base}/new      - Create
//! GET  {base}/{id}                      - Detail
//! GET  {base}/{id}/edit, POST ...       - Update
//! GET  {base}/{id}/delete, POST ...     - Confirm and delete
//! GET  /konsulent/orders/{id}/pay, POST - Confirm and pay the total
//! GET  /konsulent/orders/{id}/cancel, POST - Confirm and cancel, optional refund
//! ```
//!
//! Outcomes travel to the next page as `success=` / `error=` query
//! parameters and render as a banner.

pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod password;
pub mod people;

use askama::Template;
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;

use tmc_core::Role;

use crate::backend::ApiError;
use crate::error::AppError;
use crate::models::CurrentUser;
use crate::state::AppState;

use people::{AdminConsultants, AdminCustomers, ConsultantCustomers};

/// Build the full page router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::root))
        .merge(auth::router())
        .route("/admin", get(dashboard::admin))
        .route("/konsulent", get(dashboard::consultant))
        .merge(people::router::<AdminCustomers>())
        .merge(people::router::<AdminConsultants>())
        .merge(people::router::<ConsultantCustomers>())
        .merge(orders::router())
        .merge(password::router())
}

/// Banner messages carried in the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Flash {
    pub success: Option<String>,
    pub error: Option<String>,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: Some(message.into()),
            error: None,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: None,
            error: Some(message.into()),
        }
    }

    /// `path` with this flash appended as query parameters.
    #[must_use]
    pub fn attach(&self, path: &str) -> String {
        let mut url = path.to_string();
        for (name, value) in [("success", &self.success), ("error", &self.error)] {
            if let Some(value) = value {
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str(name);
                url.push('=');
                url.push_str(&urlencoding::encode(value));
            }
        }
        url
    }
}

/// Redirect to `path` with a banner.
pub fn redirect_with(path: &str, flash: &Flash) -> Response {
    Redirect::to(&flash.attach(path)).into_response()
}

/// Redirect to `path` with the backend's message as an error banner, or
/// end the session if the backend rejected the token.
///
/// # Errors
///
/// Returns [`AppError::SessionExpired`] for a backend 401.
pub fn redirect_failure(path: &str, error: &ApiError) -> Result<Response, AppError> {
    Ok(redirect_with(path, &Flash::error(inline_failure(error)?)))
}

/// Failure to load the record a page is about.
///
/// A record the backend does not have is a 404 page and an unreachable
/// backend a 502; anything else goes back to `path` with the backend's
/// message.
///
/// # Errors
///
/// Returns [`AppError::NotFound`], [`AppError::Backend`] or
/// [`AppError::SessionExpired`].
pub fn load_failure(path: &str, error: ApiError) -> Result<Response, AppError> {
    match error {
        ApiError::Http(_) => Err(AppError::from(error)),
        e if e.status() == Some(404) => Err(AppError::from(e)),
        e => redirect_failure(path, &e),
    }
}

/// The message to show inline for a backend failure, or session expiry for
/// a backend 401.
///
/// # Errors
///
/// Returns [`AppError::SessionExpired`] for a backend 401.
pub fn inline_failure(error: &ApiError) -> Result<String, AppError> {
    if matches!(error, ApiError::Unauthorized) {
        return Err(AppError::SessionExpired);
    }
    Ok(error.user_message())
}

/// Render a template, logging failures.
pub fn render(template: &impl Template) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// Render a form that failed validation.
pub fn render_invalid(template: &impl Template) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, render(template)).into_response()
}

/// Navigation entry in the layout shell.
#[derive(Debug, Clone)]
pub struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
}

/// Operator details and navigation for the layout shell.
#[derive(Debug, Clone)]
pub struct LayoutView {
    pub display_name: String,
    pub role: Role,
    pub nav: Vec<NavItem>,
    pub current_path: String,
    /// Only consultants get the password page.
    pub show_password_link: bool,
}

impl LayoutView {
    #[must_use]
    pub fn new(user: &CurrentUser, current_path: impl Into<String>) -> Self {
        let role = user.role();
        Self {
            display_name: user.display_name().to_string(),
            role,
            nav: nav_for(role),
            current_path: current_path.into(),
            show_password_link: role == Role::Consultant,
        }
    }

    /// Whether `href` is the active nav entry.
    #[must_use]
    pub fn is_active(&self, href: &str) -> bool {
        if href == Role::Admin.home_path() || href == Role::Consultant.home_path() {
            return self.current_path == href;
        }
        self.current_path.starts_with(href)
    }
}

fn nav_for(role: Role) -> Vec<NavItem> {
    match role {
        Role::Admin => vec![
            NavItem {
                label: "Consultant Management",
                href: "/admin/konsulent",
            },
            NavItem {
                label: "Customer Management",
                href: "/admin/customers",
            },
            NavItem {
                label: "Dashboard",
                href: "/admin",
            },
        ],
        Role::Consultant => vec![
            NavItem {
                label: "Dashboard",
                href: "/konsulent",
            },
            NavItem {
                label: "Customer Management",
                href: "/konsulent/customers",
            },
            NavItem {
                label: "Order Management",
                href: "/konsulent/orders",
            },
        ],
    }
}

/// Today's date for service date validation.
#[must_use]
pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
