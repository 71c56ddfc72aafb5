//! Integration test support for TMC admin.
//!
//! [`MockBackend`] is an in-process axum server speaking the backend's JSON
//! API on an ephemeral port. It keeps people and orders in memory, issues
//! bearer tokens on login, enforces the "no delete while owning orders" and
//! "no double payment" rules, and counts the calls tests care about.
//!
//! [`TestApp`] runs the real admin router against a mock backend and gives
//! back a cookie-keeping client that does not follow redirects.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tmc-integration-tests
//! ```

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use url::Url;

use tmc_admin::config::{AdminConfig, BackendConfig};
use tmc_admin::state::AppState;

/// Role ids as stored on person records.
pub const ROLE_ADMIN: i64 = 1;
pub const ROLE_CONSULTANT: i64 = 2;
pub const ROLE_CUSTOMER: i64 = 3;

/// Build an unsigned compact token around `claims`.
#[must_use]
pub fn make_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

/// Seconds since the Unix epoch, `offset` from now.
#[must_use]
pub fn epoch_in(offset: Duration) -> i64 {
    let at = SystemTime::now() + offset;
    at.duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

/// Calls counted by the mock backend.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub pay: AtomicUsize,
    pub refund: AtomicUsize,
    pub order_status: AtomicUsize,
    pub delete_person: AtomicUsize,
    pub create_person: AtomicUsize,
    pub list_orders: AtomicUsize,
}

impl CallCounts {
    /// Read a counter.
    #[must_use]
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

#[derive(Debug, Clone)]
struct Account {
    email: String,
    password: String,
    role: String,
    id: i64,
    name: String,
}

#[derive(Debug, Default)]
struct Data {
    accounts: Vec<Account>,
    tokens: HashSet<String>,
    people: Vec<Value>,
    orders: Vec<Value>,
    next_id: i64,
    refunds_fail: bool,
    /// `(order id, amount)` of every accepted refund.
    refunds: Vec<(i64, f64)>,
}

impl Data {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn person_mut(&mut self, id: i64) -> Option<&mut Value> {
        self.people.iter_mut().find(|p| p["id"] == id)
    }

    fn order_mut(&mut self, id: i64) -> Option<&mut Value> {
        self.orders.iter_mut().find(|o| o["orderId"] == id)
    }

    fn insert_person(&mut self, navn: &str, epost: &str, telefonnummer: &str, role_id: i64) -> Value {
        let id = self.next_id();
        let person = json!({
            "id": id,
            "navn": navn,
            "epost": epost,
            "telefonnummer": telefonnummer,
            "roleId": role_id,
        });
        self.people.push(person.clone());
        person
    }

    fn issue_token(&mut self, account: &Account) -> String {
        let token = make_token(&json!({
            "sub": account.email,
            "role": account.role,
            "id": account.id,
            "name": account.name,
            "exp": epoch_in(Duration::from_secs(3600)),
        }));
        self.tokens.insert(token.clone());
        token
    }
}

/// Shared state of a running mock backend.
#[derive(Debug, Default)]
pub struct MockState {
    data: Mutex<Data>,
    pub calls: CallCounts,
}

impl MockState {
    fn data(&self) -> MutexGuard<'_, Data> {
        self.data.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// In-process stand-in for the order-management backend.
pub struct MockBackend {
    pub url: Url,
    state: Arc<MockState>,
}

impl MockBackend {
    /// Start a mock backend on an ephemeral local port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot bind.
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        state.data().next_id = 100;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock backend failed");
        });

        let url = Url::parse(&format!("http://{addr}")).expect("Mock backend URL");
        Self { url, state }
    }

    /// Counters for the calls made so far.
    #[must_use]
    pub fn calls(&self) -> &CallCounts {
        &self.state.calls
    }

    /// Register an operator who can log in. `role` is the raw role claim.
    pub fn add_account(&self, email: &str, password: &str, role: &str, id: i64, name: &str) {
        self.state.data().accounts.push(Account {
            email: email.to_string(),
            password: password.to_string(),
            role: role.to_string(),
            id,
            name: name.to_string(),
        });
    }

    /// Issue a valid token for a registered account.
    ///
    /// # Panics
    ///
    /// Panics if no account has this email.
    #[must_use]
    pub fn issue_token(&self, email: &str) -> String {
        let mut data = self.state.data();
        let account = data
            .accounts
            .iter()
            .find(|a| a.email == email)
            .cloned()
            .expect("No such account");
        data.issue_token(&account)
    }

    /// Invalidate every issued token; later calls get 401.
    pub fn revoke_tokens(&self) {
        self.state.data().tokens.clear();
    }

    /// Make refund calls fail with 500.
    pub fn fail_refunds(&self) {
        self.state.data().refunds_fail = true;
    }

    /// Add a person record and return its id.
    ///
    /// # Panics
    ///
    /// Panics if the stored record has no numeric id.
    #[must_use]
    pub fn seed_person(&self, name: &str, email: &str, phone: &str, role_id: i64) -> i64 {
        let person = self.state.data().insert_person(name, email, phone, role_id);
        person["id"].as_i64().expect("Seeded person id")
    }

    /// Add an order for `customer_id` with one moving line and return its id.
    #[must_use]
    pub fn seed_order(&self, customer_id: i64, total: f64, order_status: &str, payment_status: &str) -> i64 {
        let mut data = self.state.data();
        let customer = data
            .people
            .iter()
            .find(|p| p["id"] == customer_id)
            .cloned()
            .unwrap_or_else(|| json!({}));
        let id = data.next_id();
        data.orders.push(json!({
            "orderId": id,
            "kundeId": customer_id,
            "kundeNavn": customer["navn"],
            "kundeEpost": customer["epost"],
            "kundeTelefonnummer": customer["telefonnummer"],
            "konsulentId": 2,
            "konsulentNavn": "Ola Konsulent",
            "tjenester": [{
                "tjenesteDato": "2030-06-01",
                "addressFrom": "Storgata 1",
                "addressTo": "Lillegata 2",
                "kommentar": "Piano",
                "tjenester": "Flytting",
                "tjenesteTypeId": 1,
                "pris": total,
            }],
            "totalPris": total,
            "orderDate": "2026-10-01",
            "orderStatus": order_status,
            "paymentStatus": payment_status,
        }));
        id
    }

    /// Overwrite an order's payment status, as another operator would.
    pub fn set_payment_status(&self, id: i64, payment_status: &str) {
        if let Some(order) = self.state.data().order_mut(id) {
            order["paymentStatus"] = json!(payment_status);
        }
    }

    /// The stored order record.
    #[must_use]
    pub fn order(&self, id: i64) -> Option<Value> {
        self.state.data().orders.iter().find(|o| o["orderId"] == id).cloned()
    }

    /// The stored person record.
    #[must_use]
    pub fn person(&self, id: i64) -> Option<Value> {
        self.state.data().people.iter().find(|p| p["id"] == id).cloned()
    }

    /// Stored person records with this email.
    #[must_use]
    pub fn people_with_email(&self, email: &str) -> Vec<Value> {
        self.state
            .data()
            .people
            .iter()
            .filter(|p| p["epost"] == email)
            .cloned()
            .collect()
    }

    /// Every accepted refund as `(order id, amount)`.
    #[must_use]
    pub fn refunds(&self) -> Vec<(i64, f64)> {
        self.state.data().refunds.clone()
    }
}

// =============================================================================
// Mock routes
// =============================================================================

type Shared = State<Arc<MockState>>;

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/account/password", put(change_password))
        .route("/api/person", post(create_customer))
        .route("/api/person/konsulent", post(create_consultant))
        .route("/api/person/customers", get(list_customers))
        .route("/api/person/konsulenter", get(list_consultants))
        .route(
            "/api/person/{id}",
            get(get_person).put(update_person).delete(delete_person),
        )
        .route("/api/orders", get(list_orders).post(create_order))
        .route("/api/orders/email-check", get(email_check))
        .route("/api/orders/payments", post(pay))
        .route("/api/orders/refunds", post(refund))
        .route("/api/orders/orderStatus", put(order_status))
        .route(
            "/api/orders/{id}",
            get(get_order).put(update_order).delete(delete_order),
        )
        .with_state(state)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn authorize(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match token {
        Some(token) if state.data().tokens.contains(token) => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED.into_response()),
    }
}

async fn login(State(state): Shared, Json(body): Json<Value>) -> Response {
    let mut data = state.data();
    let account = data
        .accounts
        .iter()
        .find(|a| body["email"] == a.email.as_str() && body["password"] == a.password.as_str())
        .cloned();
    match account {
        Some(account) => Json(json!({ "token": data.issue_token(&account) })).into_response(),
        None => error(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

async fn change_password(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    let mut data = state.data();
    let Some(account) = data
        .accounts
        .iter_mut()
        .find(|a| body["currentPassword"] == a.password.as_str())
    else {
        return error(StatusCode::BAD_REQUEST, "Current password is incorrect");
    };
    account.password = body["newPassword"].as_str().unwrap_or_default().to_string();
    StatusCode::NO_CONTENT.into_response()
}

fn create_person(state: &MockState, headers: &HeaderMap, body: &Value) -> Response {
    if let Err(rejected) = authorize(state, headers) {
        return rejected;
    }
    bump(&state.calls.create_person);
    let person = state.data().insert_person(
        body["navn"].as_str().unwrap_or_default(),
        body["epost"].as_str().unwrap_or_default(),
        body["telefonnummer"].as_str().unwrap_or_default(),
        body["roleId"].as_i64().unwrap_or_default(),
    );
    (StatusCode::CREATED, Json(person)).into_response()
}

async fn create_customer(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    create_person(&state, &headers, &body)
}

async fn create_consultant(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if body["password"].as_str().is_none_or(str::is_empty) {
        return error(StatusCode::BAD_REQUEST, "Password is required");
    }
    create_person(&state, &headers, &body)
}

fn list_people(state: &MockState, headers: &HeaderMap, role_id: i64) -> Response {
    if let Err(rejected) = authorize(state, headers) {
        return rejected;
    }
    let people: Vec<Value> = state
        .data()
        .people
        .iter()
        .filter(|p| p["roleId"] == role_id)
        .cloned()
        .collect();
    Json(people).into_response()
}

async fn list_customers(State(state): Shared, headers: HeaderMap) -> Response {
    list_people(&state, &headers, ROLE_CUSTOMER)
}

async fn list_consultants(State(state): Shared, headers: HeaderMap) -> Response {
    list_people(&state, &headers, ROLE_CONSULTANT)
}

async fn get_person(State(state): Shared, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    let person = state.data().person_mut(id).cloned();
    person.map_or_else(
        || error(StatusCode::NOT_FOUND, "Person not found"),
        |p| Json(p).into_response(),
    )
}

async fn update_person(
    State(state): Shared,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    let mut data = state.data();
    let Some(person) = data.person_mut(id) else {
        return error(StatusCode::NOT_FOUND, "Person not found");
    };
    for field in ["navn", "epost", "telefonnummer"] {
        person[field] = body[field].clone();
    }
    Json(person.clone()).into_response()
}

async fn delete_person(State(state): Shared, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    bump(&state.calls.delete_person);
    let mut data = state.data();
    if data.orders.iter().any(|o| o["kundeId"] == id) {
        return error(
            StatusCode::CONFLICT,
            "Cannot delete customer with existing orders",
        );
    }
    let before = data.people.len();
    data.people.retain(|p| p["id"] != id);
    if data.people.len() == before {
        return error(StatusCode::NOT_FOUND, "Person not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_orders(State(state): Shared, headers: HeaderMap) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    bump(&state.calls.list_orders);
    Json(state.data().orders.clone()).into_response()
}

async fn get_order(State(state): Shared, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    let order = state.data().order_mut(id).cloned();
    order.map_or_else(
        || error(StatusCode::NOT_FOUND, "Order not found"),
        |o| Json(o).into_response(),
    )
}

fn service_name(type_id: i64) -> &'static str {
    match type_id {
        1 => "Flytting",
        2 => "Rengjøring",
        _ => "Pakking",
    }
}

/// Turn an order request into a stored order, creating the customer when
/// the request names none.
fn order_from_request(data: &mut Data, id: i64, body: &Value) -> Value {
    let info = &body["kundeInfo"];
    let customer_id = body["kundeId"].as_i64().unwrap_or_else(|| {
        let person = data.insert_person(
            info["navn"].as_str().unwrap_or_default(),
            info["epost"].as_str().unwrap_or_default(),
            info["telefonnummer"].as_str().unwrap_or_default(),
            info["roleId"].as_i64().unwrap_or(ROLE_CUSTOMER),
        );
        person["id"].as_i64().unwrap_or_default()
    });

    let lines: Vec<Value> = body["tjenester"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .map(|line| {
            let mut line = line.clone();
            line["tjenester"] = json!(service_name(line["tjenesteTypeId"].as_i64().unwrap_or_default()));
            line
        })
        .collect();
    let total: f64 = lines.iter().filter_map(|l| l["pris"].as_f64()).sum();

    json!({
        "orderId": id,
        "kundeId": customer_id,
        "kundeNavn": info["navn"],
        "kundeEpost": info["epost"],
        "kundeTelefonnummer": info["telefonnummer"],
        "konsulentId": body["konsulentid"],
        "konsulentNavn": "Ola Konsulent",
        "tjenester": lines,
        "totalPris": total,
        "orderDate": "2026-10-17",
        "orderStatus": "pending",
        "paymentStatus": "unpaid",
    })
}

/// The backend only takes prices as JSON numbers.
fn require_numeric_prices(body: &Value) -> Result<(), Response> {
    let lines = body["tjenester"].as_array().map(Vec::as_slice).unwrap_or_default();
    if lines.iter().all(|line| line["pris"].is_number()) {
        Ok(())
    } else {
        Err(error(StatusCode::BAD_REQUEST, "pris must be a number"))
    }
}

async fn create_order(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    if let Err(rejected) = require_numeric_prices(&body) {
        return rejected;
    }
    let mut data = state.data();
    let id = data.next_id();
    let order = order_from_request(&mut data, id, &body);
    data.orders.push(order.clone());
    (StatusCode::CREATED, Json(order)).into_response()
}

async fn update_order(
    State(state): Shared,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    if let Err(rejected) = require_numeric_prices(&body) {
        return rejected;
    }
    let mut data = state.data();
    let Some(existing) = data.order_mut(id).cloned() else {
        return error(StatusCode::NOT_FOUND, "Order not found");
    };
    let mut updated = order_from_request(&mut data, id, &body);
    for field in ["orderStatus", "paymentStatus", "orderDate"] {
        updated[field] = existing[field].clone();
    }
    if let Some(order) = data.order_mut(id) {
        *order = updated.clone();
    }
    Json(updated).into_response()
}

async fn delete_order(State(state): Shared, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    let mut data = state.data();
    let before = data.orders.len();
    data.orders.retain(|o| o["orderId"] != id);
    if data.orders.len() == before {
        return error(StatusCode::NOT_FOUND, "Order not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn email_check(
    State(state): Shared,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    let email = query.get("email").map(String::as_str).unwrap_or_default();
    let person = state
        .data()
        .people
        .iter()
        .find(|p| p["epost"] == email)
        .cloned();
    person.map_or_else(
        || error(StatusCode::NOT_FOUND, "No person with this email"),
        |p| Json(p).into_response(),
    )
}

async fn pay(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    bump(&state.calls.pay);
    let id = body["bestilleId"].as_i64().unwrap_or_default();
    let mut data = state.data();
    let Some(order) = data.order_mut(id) else {
        return error(StatusCode::NOT_FOUND, "Order not found");
    };
    if order["paymentStatus"] == "paid" || order["paymentStatus"] == "refunded" {
        return error(StatusCode::CONFLICT, "Order already paid");
    }
    if !body["amountPaid"].is_number() {
        return error(StatusCode::BAD_REQUEST, "amountPaid must be a number");
    }
    if body["amountPaid"].as_f64() != order["totalPris"].as_f64() {
        return error(StatusCode::BAD_REQUEST, "Amount must equal the order total");
    }
    order["paymentStatus"] = json!("paid");
    StatusCode::OK.into_response()
}

async fn refund(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    bump(&state.calls.refund);
    let id = body["bestilleId"].as_i64().unwrap_or_default();
    let amount = body["amountPaid"].as_f64().unwrap_or_default();
    let mut data = state.data();
    if data.refunds_fail {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Payment provider unavailable");
    }
    let Some(order) = data.order_mut(id) else {
        return error(StatusCode::NOT_FOUND, "Order not found");
    };
    if order["paymentStatus"] != "paid" {
        return error(StatusCode::CONFLICT, "Order is not paid");
    }
    order["paymentStatus"] = json!("refunded");
    data.refunds.push((id, amount));
    StatusCode::OK.into_response()
}

async fn order_status(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    bump(&state.calls.order_status);
    let id = body["orderId"].as_i64().unwrap_or_default();
    let mut data = state.data();
    let Some(order) = data.order_mut(id) else {
        return error(StatusCode::NOT_FOUND, "Order not found");
    };
    order["orderStatus"] = body["orderStatus"].clone();
    Json(order.clone()).into_response()
}

// =============================================================================
// Admin app harness
// =============================================================================

/// The admin router served on an ephemeral port, talking to a mock backend.
pub struct TestApp {
    pub url: String,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Serve the admin router against `backend`.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot bind or the client cannot be built.
    pub async fn spawn(backend: &MockBackend) -> Self {
        let config = AdminConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            backend: BackendConfig::new(backend.url.clone()),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };
        let state = AppState::new(config).expect("Failed to build app state");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind admin app");
        let addr = listener.local_addr().expect("Admin app has no address");
        let app = tmc_admin::app(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Admin app failed");
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            url: format!("http://{addr}"),
            client,
        }
    }

    /// GET `path`.
    ///
    /// # Panics
    ///
    /// Panics if the request fails to send.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.url))
            .send()
            .await
            .expect("GET failed")
    }

    /// POST a form to `path`.
    ///
    /// # Panics
    ///
    /// Panics if the request fails to send.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.url))
            .form(form)
            .send()
            .await
            .expect("POST failed")
    }

    /// Sign in through the login form.
    ///
    /// # Panics
    ///
    /// Panics if the request fails to send.
    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post_form("/auth/login", &[("email", email), ("password", password)])
            .await
    }
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
