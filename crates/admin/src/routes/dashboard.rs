//! Dashboard route handlers.

use askama::Template;
use axum::{
    extract::{Query, State},
    response::Html,
};
use tracing::instrument;

use tmc_core::Order;

use super::{Flash, LayoutView, inline_failure, render};
use crate::backend::PersonKind;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAdmin, RequireConsultant, RequireRole};
use crate::state::AppState;
use crate::stores::{OrderStore, PersonStore};

/// Number of most recent orders on the consultant dashboard.
const RECENT_ORDERS: usize = 5;

/// Admin dashboard template.
#[derive(Template)]
#[template(path = "dashboard/admin.html")]
pub struct AdminDashboardTemplate {
    pub layout: LayoutView,
    pub flash: Flash,
    pub customer_count: usize,
    pub consultant_count: usize,
    pub errors: Vec<String>,
}

/// Consultant dashboard template.
#[derive(Template)]
#[template(path = "dashboard/konsulent.html")]
pub struct ConsultantDashboardTemplate {
    pub layout: LayoutView,
    pub flash: Flash,
    pub customer_count: usize,
    pub order_count: usize,
    pub open_orders: usize,
    pub unpaid_orders: usize,
    pub recent_orders: Vec<Order>,
    pub errors: Vec<String>,
}

/// Admin dashboard handler.
///
/// GET /admin
#[instrument(skip_all)]
pub async fn admin(
    RequireRole(user, _): RequireAdmin,
    State(state): State<AppState>,
    Query(flash): Query<Flash>,
) -> Result<Html<String>, AppError> {
    let api = user.api(state.backend());
    let customers = PersonStore::new(api.clone(), PersonKind::Customer);
    let consultants = PersonStore::new(api, PersonKind::Consultant);

    let (customer_result, consultant_result) = tokio::join!(customers.fetch_all(), consultants.fetch_all());

    let mut errors = Vec::new();
    for result in [customer_result, consultant_result] {
        if let Err(e) = result {
            errors.push(inline_failure(&e)?);
        }
    }

    let template = AdminDashboardTemplate {
        layout: LayoutView::new(&user, "/admin"),
        flash,
        customer_count: customers.snapshot().await.items.len(),
        consultant_count: consultants.snapshot().await.items.len(),
        errors,
    };

    Ok(render(&template))
}

/// Consultant dashboard handler.
///
/// GET /konsulent
#[instrument(skip_all)]
pub async fn consultant(
    RequireRole(user, _): RequireConsultant,
    State(state): State<AppState>,
    Query(flash): Query<Flash>,
) -> Result<Html<String>, AppError> {
    let api = user.api(state.backend());
    let customers = PersonStore::new(api.clone(), PersonKind::Customer);
    let orders = OrderStore::new(api);

    let (customer_result, order_result) = tokio::join!(customers.fetch_all(), orders.fetch_all());

    let mut errors = Vec::new();
    for result in [customer_result, order_result] {
        if let Err(e) = result {
            errors.push(inline_failure(&e)?);
        }
    }

    let orders = orders.snapshot().await.items;
    let open_orders = orders.iter().filter(|o| !o.order_status.is_closed()).count();
    let unpaid_orders = orders
        .iter()
        .filter(|o| !o.payment_status.is_settled())
        .count();

    let mut recent_orders = orders.clone();
    recent_orders.sort_by(|a, b| b.id.cmp(&a.id));
    recent_orders.truncate(RECENT_ORDERS);

    let template = ConsultantDashboardTemplate {
        layout: LayoutView::new(&user, "/konsulent"),
        flash,
        customer_count: customers.snapshot().await.items.len(),
        order_count: orders.len(),
        open_orders,
        unpaid_orders,
        recent_orders,
        errors,
    };

    Ok(render(&template))
}
