//! Order management route handlers.
//!
//! Consultants list, create, edit and delete orders, and drive the payment
//! and cancellation flows. Every action is re-checked against the order's
//! current statuses before the backend is called.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{Days, NaiveDate};
use serde::Deserialize;
use tracing::instrument;

use tmc_core::validation::{
    OrderErrors, OrderInput, PersonInput, ServiceLineInput, ValidOrder, validate_order,
};
use tmc_core::{Order, OrderActions, OrderId, PersonId, ServiceLine, ServiceType};

use super::{Flash, LayoutView, inline_failure, load_failure, redirect_failure, redirect_with, render, render_invalid, today};
use crate::backend::{Authorized, OrderDraft};
use crate::components::data_table::{ListQuery, Page, TableColumn, order_columns, paginate};
use crate::error::{AppError, EndSession};
use crate::filters;
use crate::middleware::{RequireConsultant, RequireRole};
use crate::models::CurrentUser;
use crate::state::AppState;
use crate::stores::{OrderStore, RefundOutcome};

const BASE: &str = "/konsulent/orders";

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(BASE, get(index))
        .route("/konsulent/orders/new", get(new_form).post(create))
        .route("/konsulent/orders/{id}", get(show))
        .route("/konsulent/orders/{id}/edit", get(edit_form).post(update))
        .route("/konsulent/orders/{id}/delete", get(delete_confirm).post(delete))
        .route("/konsulent/orders/{id}/pay", get(pay_confirm).post(pay))
        .route("/konsulent/orders/{id}/cancel", get(cancel_confirm).post(cancel))
}

fn detail_path(id: OrderId) -> String {
    format!("{BASE}/{id}")
}

// =============================================================================
// Templates
// =============================================================================

/// Orders list template.
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub layout: LayoutView,
    pub flash: Flash,
    pub page: Page<Order>,
    pub query: ListQuery,
    pub columns: Vec<TableColumn>,
    pub error: Option<String>,
}

/// Service type choice in the order form.
#[derive(Debug, Clone)]
pub struct ServiceOption {
    pub value: String,
    pub label: &'static str,
}

fn service_options() -> Vec<ServiceOption> {
    ServiceType::ALL
        .into_iter()
        .map(|t| ServiceOption {
            value: t.type_id().to_string(),
            label: t.label(),
        })
        .collect()
}

/// Order create/edit form template.
#[derive(Template)]
#[template(path = "orders/form.html")]
pub struct OrderFormTemplate {
    pub layout: LayoutView,
    pub title: String,
    pub action: String,
    pub input: OrderInput,
    pub errors: OrderErrors,
    /// Existing customer matched by the email check.
    pub customer_id: Option<PersonId>,
    /// Result of the email check.
    pub lookup: Option<String>,
    /// Backend failure.
    pub error: Option<String>,
    pub service_options: Vec<ServiceOption>,
    /// Earliest selectable service date.
    pub min_date: String,
}

impl OrderFormTemplate {
    fn new(user: &CurrentUser, title: String, action: String, form: OrderFormData) -> Self {
        let min_date = today()
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX)
            .format("%Y-%m-%d")
            .to_string();

        Self {
            layout: LayoutView::new(user, BASE),
            title,
            action,
            input: form.input,
            errors: OrderErrors::default(),
            customer_id: form.customer_id,
            lookup: None,
            error: None,
            service_options: service_options(),
            min_date,
        }
    }

    /// Field message for the service line at `index`.
    #[must_use]
    pub fn line_error(&self, index: usize) -> Option<&'static str> {
        self.errors.service(index)
    }
}

/// Order detail template.
#[derive(Template)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub layout: LayoutView,
    pub flash: Flash,
    pub order: Order,
    pub actions: OrderActions,
}

/// Delete confirmation template.
#[derive(Template)]
#[template(path = "orders/delete.html")]
pub struct OrderDeleteTemplate {
    pub layout: LayoutView,
    pub order: Order,
}

/// Payment confirmation template.
#[derive(Template)]
#[template(path = "orders/pay.html")]
pub struct OrderPayTemplate {
    pub layout: LayoutView,
    pub order: Order,
}

/// Cancel confirmation template.
#[derive(Template)]
#[template(path = "orders/cancel.html")]
pub struct OrderCancelTemplate {
    pub layout: LayoutView,
    pub order: Order,
    pub actions: OrderActions,
}

// =============================================================================
// Form parsing
// =============================================================================

/// Button pressed on the order form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormAction {
    #[default]
    Save,
    AddLine,
    RemoveLine(usize),
    CheckEmail,
}

impl FormAction {
    fn parse(raw: &str) -> Self {
        match raw {
            "add_line" => Self::AddLine,
            "check_email" => Self::CheckEmail,
            other => other
                .strip_prefix("remove_line:")
                .and_then(|i| i.parse().ok())
                .map_or(Self::Save, Self::RemoveLine),
        }
    }
}

/// Posted order form.
///
/// Service lines arrive as repeated fields; each `service_type` starts a new
/// line and the fields after it fill that line in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFormData {
    pub input: OrderInput,
    pub customer_id: Option<PersonId>,
    pub action: FormAction,
}

impl OrderFormData {
    #[must_use]
    pub fn parse(fields: Vec<(String, String)>) -> Self {
        let mut form = Self::default();

        for (name, value) in fields {
            if name == "service_type" {
                form.input.services.push(ServiceLineInput {
                    service_type: value,
                    ..ServiceLineInput::default()
                });
                continue;
            }

            let line = form.input.services.last_mut();
            match (name.as_str(), line) {
                ("customer_name", _) => form.input.customer.name = value,
                ("customer_email", _) => form.input.customer.email = value,
                ("customer_phone", _) => form.input.customer.phone = value,
                ("customer_id", _) => form.customer_id = value.parse().ok(),
                ("action", _) => form.action = FormAction::parse(&value),
                ("service_date", Some(line)) => line.service_date = value,
                ("address_from", Some(line)) => line.address_from = value,
                ("address_to", Some(line)) => line.address_to = value,
                ("comment", Some(line)) => line.comment = value,
                ("price", Some(line)) => line.price = value,
                _ => {}
            }
        }

        form
    }

    /// Prefill from an existing order.
    #[must_use]
    pub fn from_order(order: &Order) -> Self {
        Self {
            input: OrderInput {
                customer: PersonInput {
                    name: order.customer.name.clone(),
                    email: order.customer.email.clone(),
                    phone: order.customer.phone.clone(),
                },
                services: order.services.iter().map(line_input).collect(),
            },
            customer_id: order.customer_id,
            action: FormAction::Save,
        }
    }

    /// One empty line, for a new order.
    #[must_use]
    pub fn blank() -> Self {
        let mut form = Self::default();
        form.input.services.push(ServiceLineInput::default());
        form
    }
}

fn line_input(line: &ServiceLine) -> ServiceLineInput {
    ServiceLineInput {
        service_type: line
            .service_type
            .map_or_else(|| line.service_label.clone(), |t| t.type_id().to_string()),
        service_date: line
            .service_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        address_from: line.address_from.clone(),
        address_to: line.address_to.clone().unwrap_or_default(),
        comment: line.comment.clone(),
        price: line.price.amount().normalize().to_string(),
    }
}

/// Outcome of handling a posted order form.
enum Submitted {
    /// Re-render the form (line added or removed, email checked, invalid).
    Form(Response),
    /// Validated and ready for the backend.
    Valid(OrderDraft, OrderFormTemplate),
}

/// Apply the pressed button. Only `Save` with a valid form reaches the
/// backend.
async fn handle_submit(
    user: &CurrentUser,
    store: &OrderStore<Authorized>,
    mut template: OrderFormTemplate,
    action: FormAction,
) -> Result<Submitted, AppError> {
    match action {
        FormAction::AddLine => {
            template.input.services.push(ServiceLineInput::default());
            Ok(Submitted::Form(render(&template).into_response()))
        }
        FormAction::RemoveLine(index) => {
            if index >= template.input.services.len() {
                return Err(AppError::BadRequest("No such service line".to_string()));
            }
            template.input.services.remove(index);
            Ok(Submitted::Form(render(&template).into_response()))
        }
        FormAction::CheckEmail => {
            check_customer_email(store, &mut template).await?;
            Ok(Submitted::Form(render(&template).into_response()))
        }
        FormAction::Save => match validate_order(&template.input, today()) {
            Ok(order) => Ok(Submitted::Valid(draft(user, template.customer_id, order), template)),
            Err(errors) => {
                template.errors = errors;
                Ok(Submitted::Form(render_invalid(&template)))
            }
        },
    }
}

fn draft(user: &CurrentUser, customer_id: Option<PersonId>, order: ValidOrder) -> OrderDraft {
    OrderDraft {
        consultant_id: user.identity.id,
        customer_id,
        order,
    }
}

/// Look up the entered email and prefill name and phone from an existing
/// customer.
async fn check_customer_email(
    store: &OrderStore<Authorized>,
    template: &mut OrderFormTemplate,
) -> Result<(), AppError> {
    let email = template.input.customer.email.trim().to_string();
    if email.is_empty() {
        template.lookup = Some("Enter an email to check.".to_string());
        return Ok(());
    }

    match store.check_email(&email).await {
        Ok(Some(person)) => {
            template.input.customer.name = person.name;
            template.input.customer.phone = person.phone;
            template.customer_id = Some(person.id);
            template.lookup = Some("Existing customer found. Details filled in.".to_string());
        }
        Ok(None) => {
            template.customer_id = None;
            template.lookup = Some("No customer with this email. A new customer will be created.".to_string());
        }
        Err(e) => template.error = Some(inline_failure(&e)?),
    }
    Ok(())
}

/// Load an order, or fail the way [`load_failure`] describes.
async fn load(store: &OrderStore<Authorized>, id: OrderId) -> Result<Result<Order, Response>, AppError> {
    match store.fetch_by_id(id).await {
        Ok(order) => Ok(Ok(order)),
        Err(e) => load_failure(BASE, e).map(Err),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// List page.
///
/// GET /konsulent/orders
#[instrument(skip_all)]
pub async fn index(
    RequireRole(user, _): RequireConsultant,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(flash): Query<Flash>,
) -> Result<Response, AppError> {
    let store = OrderStore::new(user.api(state.backend()));
    let error = match store.fetch_all().await {
        Ok(()) => None,
        Err(e) => Some(inline_failure(&e)?),
    };
    let orders = store.snapshot().await.items;

    let template = OrdersIndexTemplate {
        layout: LayoutView::new(&user, BASE),
        flash,
        page: paginate(&orders, &query),
        query,
        columns: order_columns(),
        error,
    };
    Ok(render(&template).into_response())
}

/// New order form.
///
/// GET /konsulent/orders/new
pub async fn new_form(RequireRole(user, _): RequireConsultant) -> Response {
    let template = OrderFormTemplate::new(
        &user,
        "New Order".to_string(),
        format!("{BASE}/new"),
        OrderFormData::blank(),
    );
    render(&template).into_response()
}

/// Create an order, or apply a form button.
///
/// POST /konsulent/orders/new
#[instrument(skip_all)]
pub async fn create(
    RequireRole(user, _): RequireConsultant,
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let form = OrderFormData::parse(fields);
    let action = form.action;
    let template = OrderFormTemplate::new(&user, "New Order".to_string(), format!("{BASE}/new"), form);
    let store = OrderStore::new(user.api(state.backend()));

    let (draft, mut template) = match handle_submit(&user, &store, template, action).await? {
        Submitted::Form(response) => return Ok(response),
        Submitted::Valid(draft, template) => (draft, template),
    };

    match store.create(&draft).await {
        Ok(order) => Ok(redirect_with(
            &detail_path(order.id),
            &Flash::success("Order created successfully"),
        )),
        Err(e) => {
            template.error = Some(inline_failure(&e)?);
            Ok(render_invalid(&template))
        }
    }
}

/// Order detail with the currently allowed actions.
///
/// GET /konsulent/orders/{id}
#[instrument(skip_all, fields(order_id = %id))]
pub async fn show(
    RequireRole(user, _): RequireConsultant,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Query(flash): Query<Flash>,
) -> Result<Response, AppError> {
    let store = OrderStore::new(user.api(state.backend()));
    let order = match load(&store, id).await? {
        Ok(order) => order,
        Err(redirect) => return Ok(redirect),
    };

    let template = OrderShowTemplate {
        layout: LayoutView::new(&user, BASE),
        flash,
        actions: order.actions(),
        order,
    };
    Ok(render(&template).into_response())
}

/// Edit form, prefilled. Only open, unsettled orders may be edited.
///
/// GET /konsulent/orders/{id}/edit
#[instrument(skip_all, fields(order_id = %id))]
pub async fn edit_form(
    RequireRole(user, _): RequireConsultant,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Response, AppError> {
    let store = OrderStore::new(user.api(state.backend()));
    let order = match load(&store, id).await? {
        Ok(order) => order,
        Err(redirect) => return Ok(redirect),
    };
    if !order.actions().can_edit {
        return Ok(not_editable(id));
    }

    let template = OrderFormTemplate::new(
        &user,
        format!("Edit Order #{id}"),
        format!("{BASE}/{id}/edit"),
        OrderFormData::from_order(&order),
    );
    Ok(render(&template).into_response())
}

fn not_editable(id: OrderId) -> Response {
    redirect_with(
        &detail_path(id),
        &Flash::error("This order can no longer be edited."),
    )
}

/// Update an order, or apply a form button.
///
/// POST /konsulent/orders/{id}/edit
#[instrument(skip_all, fields(order_id = %id))]
pub async fn update(
    RequireRole(user, _): RequireConsultant,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let form = OrderFormData::parse(fields);
    let action = form.action;
    let template = OrderFormTemplate::new(
        &user,
        format!("Edit Order #{id}"),
        format!("{BASE}/{id}/edit"),
        form,
    );
    let store = OrderStore::new(user.api(state.backend()));

    let (mut draft, mut template) = match handle_submit(&user, &store, template, action).await? {
        Submitted::Form(response) => return Ok(response),
        Submitted::Valid(draft, template) => (draft, template),
    };

    let current = match load(&store, id).await? {
        Ok(order) => order,
        Err(redirect) => return Ok(redirect),
    };
    if !current.actions().can_edit {
        return Ok(not_editable(id));
    }
    draft.consultant_id = current.consultant_id.or(draft.consultant_id);

    match store.update(id, &draft).await {
        Ok(_) => Ok(redirect_with(
            &detail_path(id),
            &Flash::success("Order updated successfully"),
        )),
        Err(e) => {
            template.error = Some(inline_failure(&e)?);
            Ok(render_invalid(&template))
        }
    }
}

/// Delete confirmation.
///
/// GET /konsulent/orders/{id}/delete
#[instrument(skip_all, fields(order_id = %id))]
pub async fn delete_confirm(
    RequireRole(user, _): RequireConsultant,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Response, AppError> {
    let store = OrderStore::new(user.api(state.backend()));
    let order = match load(&store, id).await? {
        Ok(order) => order,
        Err(redirect) => return Ok(redirect),
    };

    let template = OrderDeleteTemplate {
        layout: LayoutView::new(&user, BASE),
        order,
    };
    Ok(render(&template).into_response())
}

/// Delete an order.
///
/// POST /konsulent/orders/{id}/delete
#[instrument(skip_all, fields(order_id = %id))]
pub async fn delete(
    RequireRole(user, _): RequireConsultant,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Response, AppError> {
    let store = OrderStore::new(user.api(state.backend()));
    match store.remove(id).await {
        Ok(()) => Ok(redirect_with(BASE, &Flash::success("Order deleted successfully"))),
        Err(e) => redirect_failure(BASE, &e),
    }
}

/// Payment confirmation showing the fixed total.
///
/// GET /konsulent/orders/{id}/pay
#[instrument(skip_all, fields(order_id = %id))]
pub async fn pay_confirm(
    RequireRole(user, _): RequireConsultant,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Response, AppError> {
    let store = OrderStore::new(user.api(state.backend()));
    let order = match load(&store, id).await? {
        Ok(order) => order,
        Err(redirect) => return Ok(redirect),
    };
    if !order.actions().can_pay {
        return Ok(redirect_with(
            &detail_path(id),
            &Flash::error("This order is already paid."),
        ));
    }

    let template = OrderPayTemplate {
        layout: LayoutView::new(&user, BASE),
        order,
    };
    Ok(render(&template).into_response())
}

/// Pay the order's total.
///
/// POST /konsulent/orders/{id}/pay
#[instrument(skip_all, fields(order_id = %id))]
pub async fn pay(
    RequireRole(user, _): RequireConsultant,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Response, AppError> {
    let store = OrderStore::new(user.api(state.backend()));
    let order = match load(&store, id).await? {
        Ok(order) => order,
        Err(redirect) => return Ok(redirect),
    };

    match store.pay(&order).await {
        Ok(()) => Ok(redirect_with(
            &detail_path(id),
            &Flash::success(format!("Payment of {} registered.", order.total_price)),
        )),
        Err(e) => {
            tracing::warn!(order_id = %id, error = %e, "Payment failed");
            redirect_failure(&detail_path(id), &e)
        }
    }
}

/// Cancel confirmation, with a refund toggle for paid orders.
///
/// GET /konsulent/orders/{id}/cancel
#[instrument(skip_all, fields(order_id = %id))]
pub async fn cancel_confirm(
    RequireRole(user, _): RequireConsultant,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Response, AppError> {
    let store = OrderStore::new(user.api(state.backend()));
    let order = match load(&store, id).await? {
        Ok(order) => order,
        Err(redirect) => return Ok(redirect),
    };
    let actions = order.actions();
    if !actions.can_cancel {
        return Ok(redirect_with(
            &detail_path(id),
            &Flash::error("This order can no longer be cancelled."),
        ));
    }

    let template = OrderCancelTemplate {
        layout: LayoutView::new(&user, BASE),
        order,
        actions,
    };
    Ok(render(&template).into_response())
}

/// Posted cancel confirmation. The checkbox is absent when unticked.
#[derive(Debug, Default, Deserialize)]
pub struct CancelForm {
    pub refund: Option<String>,
}

/// Banner for a completed cancellation.
fn cancel_flash(refund: &RefundOutcome) -> Flash {
    match refund {
        RefundOutcome::NotRequested => Flash::success("Order cancelled."),
        RefundOutcome::Refunded(amount) => {
            Flash::success(format!("Order cancelled and {amount} refunded."))
        }
        RefundOutcome::Failed(message) => Flash {
            success: Some("Order cancelled.".to_string()),
            error: Some(message.clone()),
        },
        RefundOutcome::SessionExpired => Flash {
            success: Some("Order cancelled.".to_string()),
            error: Some(
                "Your session expired before the refund was made. Log in and refund the order manually."
                    .to_string(),
            ),
        },
    }
}

/// Cancel the order, refunding the total if asked and it was paid.
///
/// POST /konsulent/orders/{id}/cancel
#[instrument(skip_all, fields(order_id = %id))]
pub async fn cancel(
    RequireRole(user, _): RequireConsultant,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Form(form): Form<CancelForm>,
) -> Result<Response, AppError> {
    let store = OrderStore::new(user.api(state.backend()));
    let order = match load(&store, id).await? {
        Ok(order) => order,
        Err(redirect) => return Ok(redirect),
    };

    match store.cancel(&order, form.refund.is_some()).await {
        Ok(outcome) if outcome.refund == RefundOutcome::SessionExpired => {
            let mut response = redirect_with("/auth/login", &cancel_flash(&outcome.refund));
            response.extensions_mut().insert(EndSession);
            Ok(response)
        }
        Ok(outcome) => Ok(redirect_with(&detail_path(id), &cancel_flash(&outcome.refund))),
        Err(e) => redirect_failure(&detail_path(id), &e),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;
    use tmc_core::Price;

    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parse_groups_repeated_service_fields() {
        let form = OrderFormData::parse(fields(&[
            ("customer_name", "Kari"),
            ("customer_email", "kari@example.no"),
            ("customer_phone", "1234567890"),
            ("customer_id", "12"),
            ("service_type", "1"),
            ("service_date", "2030-01-01"),
            ("address_from", "Storgata 1"),
            ("address_to", "Lillegata 2"),
            ("comment", "Piano"),
            ("price", "4500"),
            ("service_type", "2"),
            ("service_date", "2030-01-02"),
            ("address_from", "Lillegata 2"),
            ("address_to", ""),
            ("comment", "Vinduer"),
            ("price", "900"),
            ("action", "save"),
        ]));

        assert_eq!(form.customer_id, Some(PersonId::new(12)));
        assert_eq!(form.action, FormAction::Save);
        assert_eq!(form.input.services.len(), 2);
        assert_eq!(form.input.services[1].service_type, "2");
        assert_eq!(form.input.services[1].comment, "Vinduer");
        assert_eq!(form.input.services[0].address_to, "Lillegata 2");
    }

    #[test]
    fn test_parse_ignores_line_fields_before_first_line() {
        let form = OrderFormData::parse(fields(&[("price", "100"), ("customer_id", "")]));
        assert!(form.input.services.is_empty());
        assert_eq!(form.customer_id, None);
    }

    #[test]
    fn test_form_action_parse() {
        assert_eq!(FormAction::parse("add_line"), FormAction::AddLine);
        assert_eq!(FormAction::parse("remove_line:2"), FormAction::RemoveLine(2));
        assert_eq!(FormAction::parse("remove_line:x"), FormAction::Save);
        assert_eq!(FormAction::parse("check_email"), FormAction::CheckEmail);
        assert_eq!(FormAction::parse("save"), FormAction::Save);
    }

    #[test]
    fn test_line_input_prefers_type_id_and_plain_price() {
        let line = ServiceLine {
            service_type: Some(ServiceType::Cleaning),
            service_label: "Rengjøring".to_string(),
            service_date: NaiveDate::from_ymd_opt(2030, 3, 4),
            address_from: "Storgata 1".to_string(),
            address_to: None,
            comment: "Trapp".to_string(),
            price: Price::new(Decimal::new(150_050, 2)),
        };
        let input = line_input(&line);
        assert_eq!(input.service_type, "2");
        assert_eq!(input.service_date, "2030-03-04");
        assert_eq!(input.address_to, "");
        assert_eq!(input.price, "1500.5");

        let unknown = ServiceLine {
            service_type: None,
            service_label: "Lagring".to_string(),
            ..line
        };
        assert_eq!(line_input(&unknown).service_type, "Lagring");
    }

    #[test]
    fn test_cancel_flash_reports_refund_separately() {
        let flash = cancel_flash(&RefundOutcome::Failed("Refund failed.".to_string()));
        assert_eq!(flash.success.as_deref(), Some("Order cancelled."));
        assert_eq!(flash.error.as_deref(), Some("Refund failed."));

        let flash = cancel_flash(&RefundOutcome::SessionExpired);
        assert_eq!(flash.success.as_deref(), Some("Order cancelled."));
        assert!(flash.error.unwrap().contains("refund the order manually"));

        let flash = cancel_flash(&RefundOutcome::NotRequested);
        assert!(flash.error.is_none());
    }
}
