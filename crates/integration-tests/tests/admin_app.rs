//! End-to-end tests for the admin web app.
//!
//! Each test serves the real router on an ephemeral port against a fresh
//! mock backend and drives it with a cookie-keeping HTTP client, so session
//! handling, role gates, form validation and redirects are all covered.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::StatusCode;

use tmc_admin::error::SESSION_EXPIRED_REDIRECT;
use tmc_integration_tests::{
    CallCounts, MockBackend, ROLE_CONSULTANT, ROLE_CUSTOMER, TestApp, location,
};

const ADMIN_EMAIL: &str = "admin@tmc.no";
const ADMIN_PASSWORD: &str = "admin-secret";
const CONSULTANT_EMAIL: &str = "ola@tmc.no";
const CONSULTANT_PASSWORD: &str = "konsulent-secret";

async fn setup() -> (MockBackend, TestApp) {
    let backend = MockBackend::start().await;
    backend.add_account(ADMIN_EMAIL, ADMIN_PASSWORD, "admin", 1, "Kari Admin");
    backend.add_account(CONSULTANT_EMAIL, CONSULTANT_PASSWORD, "konsulent", 2, "Ola Konsulent");
    let app = TestApp::spawn(&backend).await;
    (backend, app)
}

// =============================================================================
// Authentication and role gates
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (_backend, app) = setup().await;

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_unauthenticated_request_redirects_to_login() {
    let (_backend, app) = setup().await;

    let response = app.get("/admin/customers").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/auth/login"));
}

#[tokio::test]
async fn test_login_page_renders() {
    let (_backend, app) = setup().await;

    let response = app.get("/auth/login").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("password"));
}

#[tokio::test]
async fn test_wrong_password_shows_error() {
    let (_backend, app) = setup().await;

    let response = app.login(ADMIN_EMAIL, "wrong").await;
    assert!(response.status().is_success());
    assert!(response.text().await.unwrap().contains("Invalid credentials."));

    let response = app.get("/admin").await;
    assert_eq!(location(&response).as_deref(), Some("/auth/login"));
}

#[tokio::test]
async fn test_admin_login_lands_on_admin_area() {
    let (_backend, app) = setup().await;

    let response = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/admin"));

    let response = app.get("/admin").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_consultant_is_forbidden_from_admin_area() {
    let (_backend, app) = setup().await;

    let response = app.login(CONSULTANT_EMAIL, CONSULTANT_PASSWORD).await;
    assert_eq!(location(&response).as_deref(), Some("/konsulent"));

    assert_eq!(app.get("/admin").await.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        app.get("/admin/konsulent").await.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(app.get("/konsulent").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_is_forbidden_from_consultant_area() {
    let (_backend, app) = setup().await;
    app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    assert_eq!(
        app.get("/konsulent/orders").await.status(),
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_logout_clears_session() {
    let (_backend, app) = setup().await;
    app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = app.post_form("/auth/logout", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).unwrap().starts_with("/auth/login"));

    let response = app.get("/admin").await;
    assert_eq!(location(&response).as_deref(), Some("/auth/login"));
}

#[tokio::test]
async fn test_rejected_token_ends_session() {
    let (backend, app) = setup().await;
    app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    backend.revoke_tokens();

    let response = app.get("/admin/customers").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some(SESSION_EXPIRED_REDIRECT));

    // The session is gone, so the next page goes straight to login.
    let response = app.get("/admin").await;
    assert_eq!(location(&response).as_deref(), Some("/auth/login"));
}

// =============================================================================
// People
// =============================================================================

#[tokio::test]
async fn test_admin_creates_customer_through_form() {
    let (backend, app) = setup().await;
    app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = app
        .post_form(
            "/admin/customers/new",
            &[
                ("name", "Per Hansen"),
                ("email", "per@example.no"),
                ("phone", "4712345678"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).unwrap().starts_with("/admin/customers"));

    let stored = backend.people_with_email("per@example.no");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["roleId"], ROLE_CUSTOMER);

    let page = app.get("/admin/customers").await.text().await.unwrap();
    assert!(page.contains("Per Hansen"));
}

#[tokio::test]
async fn test_invalid_customer_form_is_rerendered() {
    let (backend, app) = setup().await;
    app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = app
        .post_form(
            "/admin/customers/new",
            &[
                ("name", "Per Hansen"),
                ("email", "per@example.no"),
                ("phone", "12345"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let page = response.text().await.unwrap();
    assert!(page.contains("Phone number must be 10 digits."));
    assert!(page.contains("Per Hansen"));

    assert_eq!(CallCounts::get(&backend.calls().create_person), 0);
}

#[tokio::test]
async fn test_blocked_delete_reports_reason() {
    let (backend, app) = setup().await;
    let id = backend.seed_person("Per Hansen", "per@example.no", "4712345678", ROLE_CUSTOMER);
    let _order = backend.seed_order(id, 2500.0, "pending", "unpaid");
    app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = app
        .post_form(&format!("/admin/customers/{id}/delete"), &[])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = location(&response).unwrap();
    assert!(target.starts_with("/admin/customers"));

    let page = app.get(&target).await.text().await.unwrap();
    assert!(page.contains("Cannot delete customer with existing orders"));
    assert!(backend.person(id).is_some());
}

#[tokio::test]
async fn test_customer_section_cannot_edit_consultant() {
    let (backend, app) = setup().await;
    let id = backend.seed_person("Eva Konsulent", "eva@tmc.no", "4798765432", ROLE_CONSULTANT);
    app.login(CONSULTANT_EMAIL, CONSULTANT_PASSWORD).await;

    let response = app
        .post_form(
            &format!("/konsulent/customers/{id}/edit"),
            &[
                ("name", "Renamed"),
                ("email", "eva@tmc.no"),
                ("phone", "4798765432"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = location(&response).unwrap();
    assert!(target.starts_with("/konsulent/customers?"));
    assert!(target.contains("error="));

    let stored = backend.person(id).unwrap();
    assert_eq!(stored["navn"], "Eva Konsulent");
    assert_eq!(stored["roleId"], ROLE_CONSULTANT);
}

#[tokio::test]
async fn test_customer_section_cannot_delete_consultant() {
    let (backend, app) = setup().await;
    let id = backend.seed_person("Eva Konsulent", "eva@tmc.no", "4798765432", ROLE_CONSULTANT);
    app.login(CONSULTANT_EMAIL, CONSULTANT_PASSWORD).await;

    let response = app
        .post_form(&format!("/konsulent/customers/{id}/delete"), &[])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).unwrap().contains("error="));

    assert!(backend.person(id).is_some());
    assert_eq!(CallCounts::get(&backend.calls().delete_person), 0);
}

#[tokio::test]
async fn test_consultant_section_cannot_delete_customer() {
    let (backend, app) = setup().await;
    let id = backend.seed_person("Per Hansen", "per@example.no", "4712345678", ROLE_CUSTOMER);
    app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = app
        .post_form(&format!("/admin/konsulent/{id}/delete"), &[])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(backend.person(id).is_some());
    assert_eq!(CallCounts::get(&backend.calls().delete_person), 0);
}

#[tokio::test]
async fn test_malformed_list_query_uses_defaults() {
    let (backend, app) = setup().await;
    backend.seed_person("Per Hansen", "per@example.no", "4712345678", ROLE_CUSTOMER);
    app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = app.get("/admin/customers?page=abc&dir=").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Per Hansen"));
}

#[tokio::test]
async fn test_missing_customer_is_not_found() {
    let (_backend, app) = setup().await;
    app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = app.get("/admin/customers/9999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.text().await.unwrap().contains("Person not found"));
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_consultant_creates_order_for_new_customer() {
    let (backend, app) = setup().await;
    app.login(CONSULTANT_EMAIL, CONSULTANT_PASSWORD).await;

    let response = app
        .post_form(
            "/konsulent/orders/new",
            &[
                ("customer_name", "Per Hansen"),
                ("customer_email", "per@example.no"),
                ("customer_phone", "4712345678"),
                ("service_type", "1"),
                ("service_date", "2030-06-01"),
                ("address_from", "Storgata 1"),
                ("address_to", "Lillegata 2"),
                ("comment", "Piano"),
                ("price", "2500"),
                ("action", "save"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let customers = backend.people_with_email("per@example.no");
    assert_eq!(customers.len(), 1);
    let page = app.get("/konsulent/orders").await.text().await.unwrap();
    assert!(page.contains("Per Hansen"));
}

#[tokio::test]
async fn test_order_with_past_date_is_rejected() {
    let (backend, app) = setup().await;
    app.login(CONSULTANT_EMAIL, CONSULTANT_PASSWORD).await;

    let response = app
        .post_form(
            "/konsulent/orders/new",
            &[
                ("customer_name", "Per Hansen"),
                ("customer_email", "per@example.no"),
                ("customer_phone", "4712345678"),
                ("service_type", "2"),
                ("service_date", "2001-01-01"),
                ("address_from", "Storgata 1"),
                ("comment", "Vinduer"),
                ("price", "900"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("Service date must be in the future.")
    );
    assert!(backend.people_with_email("per@example.no").is_empty());
}

#[tokio::test]
async fn test_pay_flow_registers_payment() {
    let (backend, app) = setup().await;
    let customer = backend.seed_person("Per Hansen", "per@example.no", "4712345678", ROLE_CUSTOMER);
    let id = backend.seed_order(customer, 2500.0, "pending", "unpaid");
    app.login(CONSULTANT_EMAIL, CONSULTANT_PASSWORD).await;

    let confirm = app.get(&format!("/konsulent/orders/{id}/pay")).await;
    assert_eq!(confirm.status(), StatusCode::OK);

    let response = app
        .post_form(&format!("/konsulent/orders/{id}/pay"), &[])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(CallCounts::get(&backend.calls().pay), 1);
    assert_eq!(backend.order(id).unwrap()["paymentStatus"], "paid");

    let page = app.get(&location(&response).unwrap()).await.text().await.unwrap();
    assert!(page.contains("Payment of 2500 kr registered."));
}

#[tokio::test]
async fn test_paid_order_pay_page_redirects() {
    let (backend, app) = setup().await;
    let customer = backend.seed_person("Per Hansen", "per@example.no", "4712345678", ROLE_CUSTOMER);
    let id = backend.seed_order(customer, 2500.0, "pending", "paid");
    app.login(CONSULTANT_EMAIL, CONSULTANT_PASSWORD).await;

    let response = app.get(&format!("/konsulent/orders/{id}/pay")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(CallCounts::get(&backend.calls().pay), 0);
}

#[tokio::test]
async fn test_cancel_with_refund_flow() {
    let (backend, app) = setup().await;
    let customer = backend.seed_person("Per Hansen", "per@example.no", "4712345678", ROLE_CUSTOMER);
    let id = backend.seed_order(customer, 2500.0, "pending", "paid");
    app.login(CONSULTANT_EMAIL, CONSULTANT_PASSWORD).await;

    let response = app
        .post_form(&format!("/konsulent/orders/{id}/cancel"), &[("refund", "on")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(backend.refunds(), vec![(id, 2500.0)]);
    assert_eq!(backend.order(id).unwrap()["orderStatus"], "cancelled");

    let page = app.get(&location(&response).unwrap()).await.text().await.unwrap();
    assert!(page.contains("Order cancelled and 2500 kr refunded."));
}

#[tokio::test]
async fn test_missing_order_is_not_found() {
    let (_backend, app) = setup().await;
    app.login(CONSULTANT_EMAIL, CONSULTANT_PASSWORD).await;

    let response = app.get("/konsulent/orders/9999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.text().await.unwrap().contains("Order not found"));
}

#[tokio::test]
async fn test_removing_unknown_service_line_is_bad_request() {
    let (backend, app) = setup().await;
    app.login(CONSULTANT_EMAIL, CONSULTANT_PASSWORD).await;

    let response = app
        .post_form(
            "/konsulent/orders/new",
            &[
                ("customer_name", "Per Hansen"),
                ("customer_email", "per@example.no"),
                ("customer_phone", "4712345678"),
                ("service_type", "1"),
                ("service_date", "2030-06-01"),
                ("address_from", "Storgata 1"),
                ("price", "2500"),
                ("action", "remove_line:7"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(backend.people_with_email("per@example.no").is_empty());
}

#[tokio::test]
async fn test_order_form_defaults_to_save() {
    let (_backend, app) = setup().await;
    app.login(CONSULTANT_EMAIL, CONSULTANT_PASSWORD).await;

    let page = app.get("/konsulent/orders/new").await.text().await.unwrap();
    let first_action = page.find(r#"name="action""#).unwrap();
    let check_email = page.find(r#"value="check_email""#).unwrap();
    assert!(page[first_action..].starts_with(r#"name="action" value="save""#));
    assert!(first_action < check_email);
}

#[tokio::test]
async fn test_failed_refund_shows_backend_reason_once() {
    let (backend, app) = setup().await;
    let customer = backend.seed_person("Per Hansen", "per@example.no", "4712345678", ROLE_CUSTOMER);
    let id = backend.seed_order(customer, 2500.0, "pending", "paid");
    backend.fail_refunds();
    app.login(CONSULTANT_EMAIL, CONSULTANT_PASSWORD).await;

    let response = app
        .post_form(&format!("/konsulent/orders/{id}/cancel"), &[("refund", "on")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(backend.order(id).unwrap()["orderStatus"], "cancelled");

    let page = app.get(&location(&response).unwrap()).await.text().await.unwrap();
    assert!(page.contains("Order cancelled."));
    assert_eq!(page.matches("Refund failed.").count(), 1);
    assert!(!page.contains("Refund failed: Refund failed."));
}
