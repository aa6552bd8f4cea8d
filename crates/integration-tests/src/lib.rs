//! Integration tests for the KOS storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kos-integration-tests
//! ```
//!
//! Everything runs locally: stores persist to a temporary directory and API
//! calls go to [`FakeBackend`], an in-process `axum` server that speaks the
//! storefront backend's JSON.
//!
//! # Test Categories
//!
//! - `cart_store` / `wishlist_store` - persistence across restarts
//! - `api_client` - HTTP client against the fake backend
//! - `checkout` - order placement end to end
//! - `admin` - admin calls and the server-push order feed

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use kos_storefront::config::{LogFormat, StorefrontConfig};
use kos_storefront::state::AppState;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Token the fake backend hands out and accepts.
pub const TEST_TOKEN: &str = "test-token-1";
/// Token of an admin account.
pub const ADMIN_TOKEN: &str = "admin-token-1";
/// Password the fake backend accepts.
pub const TEST_PASSWORD: &str = "correct horse";
/// Product id the fake backend refuses to sell.
pub const OUT_OF_STOCK_ID: i64 = 99;

/// A storage directory plus configuration pointing at a backend.
pub struct TestContext {
    dir: TempDir,
    config: StorefrontConfig,
}

impl TestContext {
    /// Context whose API base is unreachable; for offline store tests.
    #[must_use]
    pub fn offline() -> Self {
        Self::with_api_base("http://127.0.0.1:9")
    }

    #[must_use]
    pub fn with_api_base(base: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let config = StorefrontConfig {
            api_base: base.parse().unwrap(),
            storage_dir: dir.path().join("kos"),
            catalog_cache_ttl: Duration::from_secs(60),
            http_timeout: Duration::from_secs(5),
            log_format: LogFormat::Pretty,
        };
        Self { dir, config }
    }

    /// Build application state over the context's directory.
    ///
    /// Calling this again simulates restarting the application.
    #[must_use]
    pub fn state(&self) -> AppState {
        AppState::new(self.config.clone()).unwrap()
    }

    #[must_use]
    pub fn storage_dir(&self) -> &Path {
        &self.config.storage_dir
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a raw document as if an earlier version had stored it.
    pub fn write_document(&self, key: &str, contents: &str) {
        std::fs::create_dir_all(self.storage_dir()).unwrap();
        std::fs::write(self.storage_dir().join(format!("{key}.json")), contents).unwrap();
    }

    /// Read a stored document back, if present.
    #[must_use]
    pub fn read_document(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.storage_dir().join(format!("{key}.json"))).ok()
    }
}

// =============================================================================
// Fake backend
// =============================================================================

#[derive(Default)]
struct BackendState {
    product_requests: AtomicUsize,
    orders: Mutex<Vec<(Value, Option<String>)>>,
    status_updates: Mutex<Vec<(String, Value)>>,
    admin_grants: Mutex<Vec<(String, Value)>>,
}

/// In-process stand-in for the storefront backend.
pub struct FakeBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
}

impl FakeBackend {
    /// Bind to an ephemeral port and serve in the background.
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());
        let app = Router::new()
            .route("/api/products", get(products))
            .route("/api/categories", get(categories))
            .route("/api/products/{id}/reviews", get(reviews).post(add_review))
            .route("/api/auth/login", post(login))
            .route("/api/auth/me", get(me))
            .route("/api/auth/logout", post(logout))
            .route("/api/orders", post(create_order))
            .route("/api/orders/my", get(my_orders))
            .route("/api/rewards/balance", get(reward_balance))
            .route("/api/rewards/history", get(reward_history))
            .route("/api/admin/orders", get(admin_orders))
            .route("/api/admin/users", get(admin_users))
            .route("/api/admin/orders/{id}/status", post(update_order_status))
            .route("/api/auth/users/{id}/admin", post(set_user_admin))
            .route("/api/admin/events", get(admin_events))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// How many times `/api/products` was requested.
    #[must_use]
    pub fn product_requests(&self) -> usize {
        self.state.product_requests.load(Ordering::SeqCst)
    }

    /// Accepted and rejected order bodies, with the bearer token sent.
    #[must_use]
    pub fn orders(&self) -> Vec<(Value, Option<String>)> {
        self.state.orders.lock().unwrap().clone()
    }

    /// Order status changes received, as `(order id, body)`.
    #[must_use]
    pub fn status_updates(&self) -> Vec<(String, Value)> {
        self.state.status_updates.lock().unwrap().clone()
    }

    /// Admin grants received, as `(user id, body)`.
    #[must_use]
    pub fn admin_grants(&self) -> Vec<(String, Value)> {
        self.state.admin_grants.lock().unwrap().clone()
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn authorized(headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    if bearer(headers).as_deref() == Some(TEST_TOKEN) {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"ok": false, "error": "Unauthorized"})),
        ))
    }
}

fn admin(headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    match bearer(headers).as_deref() {
        Some(ADMIN_TOKEN) => Ok(()),
        Some(TEST_TOKEN) => Err((
            StatusCode::FORBIDDEN,
            Json(json!({"ok": false, "error": "Forbidden"})),
        )),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"ok": false, "error": "Unauthorized"})),
        )),
    }
}

fn admin_order(status: &str) -> Value {
    json!({
        "id": 501,
        "customer": {"name": "Mariam", "phone": "+974 5555 0000", "city": "Doha"},
        "items": [{"id": 1, "name": "Serum", "price": 30, "qty": 2}],
        "totals": {"subtotal": 60, "shipping": 0, "total": 60},
        "status": status,
        "date": "2024-03-02T08:30:00Z"
    })
}

async fn products(State(state): State<Arc<BackendState>>) -> Json<Value> {
    state.product_requests.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "ok": true,
        "products": [
            {"id": 1, "name": "Serum", "price": 30, "currency": "QAR", "categoryId": 2,
             "image_128": "iVBORw0KGgo="},
            {"id": 2, "name": "Cream", "price": "45.5"},
            {"id": OUT_OF_STOCK_ID, "name": "Limited palette", "price": 120},
            {"name": "Gift box", "price": 0}
        ]
    }))
}

async fn categories() -> Json<Value> {
    Json(json!({"ok": true, "categories": [{"id": 2, "name": "Skincare"}]}))
}

async fn reviews(UrlPath(id): UrlPath<String>) -> Json<Value> {
    let reviews = if id == "1" {
        json!([{"id": 7, "name": "Noor", "text": "Lovely", "rating": 5,
                "date": "2024-03-01T10:00:00Z"}])
    } else {
        json!([])
    };
    Json(json!({"ok": true, "reviews": reviews}))
}

async fn add_review(UrlPath(_id): UrlPath<String>, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({"ok": true, "review": {
        "id": 8,
        "name": body["name"],
        "text": body["text"],
        "rating": body["rating"]
    }}))
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["password"] == TEST_PASSWORD {
        (
            StatusCode::OK,
            Json(json!({"ok": true, "token": TEST_TOKEN,
                        "user": {"id": 5, "username": "mariam", "email": body["email"]}})),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"ok": false, "error": "Invalid credentials"})),
        )
    }
}

async fn me(headers: HeaderMap) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    authorized(&headers)?;
    Ok(Json(json!({"ok": true, "user": {"id": 5, "username": "mariam",
                                        "email": "mariam@example.qa"}})))
}

async fn logout() -> Json<Value> {
    Json(json!({"ok": true}))
}

async fn create_order(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state
        .orders
        .lock()
        .unwrap()
        .push((body.clone(), bearer(&headers)));

    let items = body["items"].as_array().cloned().unwrap_or_default();
    if items.iter().any(|item| item["id"] == OUT_OF_STOCK_ID) {
        return (
            StatusCode::CONFLICT,
            Json(json!({"ok": false, "error": "Limited palette is out of stock"})),
        );
    }

    let rewards = if bearer(&headers).is_some() {
        json!({"earnedPoints": 60, "appliedRedeemPoints": 100, "appliedDiscountQar": 5})
    } else {
        Value::Null
    };
    (
        StatusCode::OK,
        Json(json!({
            "ok": true,
            "order": {"id": 501, "items": items, "totals": body["totals"], "status": "placed"},
            "rewards": rewards
        })),
    )
}

async fn my_orders(headers: HeaderMap) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    authorized(&headers)?;
    Ok(Json(json!({"ok": true, "orders": [{
        "id": 501,
        "items": [{"id": 1, "name": "Serum", "price": 30, "qty": 2}],
        "totals": {"subtotal": 60, "shipping": 0, "total": 60},
        "status": "shipped",
        "createdAt": "2024-03-02T08:30:00Z"
    }]})))
}

async fn reward_balance(headers: HeaderMap) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    authorized(&headers)?;
    Ok(Json(json!({"ok": true, "points": 340, "tier": "Silver", "earnRate": 1,
                   "redeemRate": 0.05, "maxRedeemPct": 0.5, "expiryMonths": 24,
                   "nextExpiryAt": null})))
}

async fn reward_history(headers: HeaderMap) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    authorized(&headers)?;
    Ok(Json(json!({"ok": true, "history": [
        {"type": "earn", "delta": 60, "createdAt": "2024-03-02T08:30:00Z"},
        {"type": "redeem", "delta": -100, "createdAt": "2024-03-05T12:00:00Z"}
    ]})))
}

async fn admin_orders(headers: HeaderMap) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    admin(&headers)?;
    Ok(Json(json!({"ok": true, "orders": [admin_order("placed")]})))
}

async fn admin_users(headers: HeaderMap) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    admin(&headers)?;
    Ok(Json(json!({"ok": true, "users": [
        {"id": 1, "username": "owner", "email": "owner@kos.qa", "isAdmin": true,
         "createdAt": "2023-11-01T09:00:00Z"},
        {"id": 5, "username": "mariam", "email": "mariam@example.qa", "isAdmin": false,
         "createdAt": "2024-02-20T17:45:00Z"}
    ]})))
}

async fn update_order_status(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    admin(&headers)?;
    if id != "501" {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({"ok": false, "error": "Order not found"})),
        ));
    }
    state
        .status_updates
        .lock()
        .unwrap()
        .push((id, body.clone()));
    let status = body["status"].as_str().unwrap_or("placed");
    Ok(Json(json!({"ok": true, "order": admin_order(status)})))
}

async fn set_user_admin(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    admin(&headers)?;
    state.admin_grants.lock().unwrap().push((id, body));
    Ok(Json(json!({"ok": true})))
}

fn order_event(kind: &str, status: &str) -> Event {
    Event::default().data(json!({"type": kind, "order": admin_order(status)}).to_string())
}

/// A short feed that closes after a handful of messages, mixing in the
/// noise a real feed carries.
async fn admin_events(Query(params): Query<HashMap<String, String>>) -> Response {
    if params.get("token").map(String::as_str) != Some(ADMIN_TOKEN) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"ok": false, "error": "Unauthorized"})),
        )
            .into_response();
    }

    let messages = vec![
        Event::default().comment("keep-alive"),
        order_event("order.created", "placed"),
        Event::default().data(json!({"type": "user.created", "user": {"id": 9}}).to_string()),
        Event::default().data("not json"),
        order_event("order.updated", "shipped"),
    ];
    Sse::new(futures::stream::iter(
        messages.into_iter().map(Ok::<_, Infallible>),
    ))
    .into_response()
}
