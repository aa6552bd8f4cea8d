//! Storefront REST API client.
//!
//! # Architecture
//!
//! - Plain JSON over `reqwest`; the backend is the source of truth for
//!   catalog, accounts, orders and loyalty
//! - Catalog listings and categories are cached in memory via `moka`
//! - The admin feed is a long-lived `text/event-stream` read chunk by chunk
//! - No retries: a failed call is reported to the caller as-is
//!
//! Failed responses carry `{ "error": "..." }`; that message (or
//! `API error: <status>`) becomes [`ApiError::Api`].
//!
//! # Example
//!
//! ```rust,ignore
//! use kos_storefront::api::{ApiClient, ProductQuery};
//!
//! let api = ApiClient::new(&config)?;
//! let products = api.list_products(24).await?;
//! let serums = api
//!     .search_products(&ProductQuery { q: Some("serum".into()), ..Default::default() })
//!     .await?;
//! ```

mod cache;
mod events;
pub mod types;

use std::sync::Arc;

use futures::Stream;
use kos_core::{OrderId, OrderStatus, UserId};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::StorefrontConfig;
use cache::{CacheKey, CacheValue};

pub use events::AdminEvent;
pub use types::*;

/// Errors that can occur when talking to the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the request.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(String),

    /// The call needs a signed-in customer.
    #[error("Not authenticated")]
    NotAuthenticated,
}

const USER_AGENT: &str = concat!("kos-storefront/", env!("CARGO_PKG_VERSION"));

/// Client for the storefront backend.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    /// No overall timeout; used for the admin feed.
    feed_client: reqwest::Client,
    base: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.inner.base.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        let feed_client = reqwest::Client::builder()
            .connect_timeout(config.http_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(256)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                feed_client,
                base: config.api_base.clone(),
                cache,
            }),
        })
    }

    /// The backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    /// Build an endpoint URL from path segments, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Url(format!("{} cannot be a base", self.inner.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError> {
        let mut request = self.inner.client.get(url);
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        parse_response(request.send().await?).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: Option<&B>,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError> {
        let mut request = self.inner.client.post(url);
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        parse_response(request.send().await?).await
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// List the newest products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, limit: u32) -> Result<Vec<Product>, ApiError> {
        let key = CacheKey::Products { limit };
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let mut url = self.url(&["api", "products"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());

        let envelope: ProductsEnvelope = self.get(url, None).await?;
        self.inner
            .cache
            .insert(key, CacheValue::Products(envelope.products.clone()))
            .await;
        Ok(envelope.products)
    }

    /// Search and filter products. Never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let mut url = self.url(&["api", "products"])?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.to_pairs() {
                pairs.append_pair(key, &value);
            }
        }
        let envelope: ProductsEnvelope = self.get(url, None).await?;
        Ok(envelope.products)
    }

    /// Find one product by key among the listed catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn find_product(
        &self,
        id: &kos_core::ProductId,
    ) -> Result<Option<Product>, ApiError> {
        let products = self.list_products(200).await?;
        Ok(products.into_iter().find(|p| p.key().same_as(id)))
    }

    /// List product categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let envelope: CategoriesEnvelope = self.get(self.url(&["api", "categories"])?, None).await?;
        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(envelope.categories.clone()),
            )
            .await;
        Ok(envelope.categories)
    }

    /// Drop all cached catalog data.
    pub async fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    // =========================================================================
    // Review Methods
    // =========================================================================

    /// Reviews for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product = %product))]
    pub async fn reviews(&self, product: &kos_core::ProductId) -> Result<Vec<Review>, ApiError> {
        let id = product.normalized();
        let url = self.url(&["api", "products", &id, "reviews"])?;
        let envelope: ReviewsEnvelope = self.get(url, None).await?;
        Ok(envelope.reviews)
    }

    /// Post a review for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, review), fields(product = %product))]
    pub async fn submit_review(
        &self,
        product: &kos_core::ProductId,
        review: &NewReview,
    ) -> Result<Review, ApiError> {
        let id = product.normalized();
        let url = self.url(&["api", "products", &id, "reviews"])?;
        let envelope: ReviewEnvelope = self.post(url, Some(review), None).await?;
        Ok(envelope.review)
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the account exists.
    #[instrument(skip_all, fields(username = %request.username))]
    pub async fn signup(&self, request: &SignupRequest) -> Result<AuthGrant, ApiError> {
        self.post(self.url(&["api", "auth", "signup"])?, Some(request), None)
            .await
    }

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the credentials are wrong.
    #[instrument(skip_all)]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthGrant, ApiError> {
        self.post(self.url(&["api", "auth", "login"])?, Some(request), None)
            .await
    }

    /// The account a token belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the token is rejected.
    #[instrument(skip_all)]
    pub async fn me(&self, token: &SecretString) -> Result<User, ApiError> {
        let envelope: UserEnvelope = self
            .get(self.url(&["api", "auth", "me"])?, Some(token))
            .await?;
        Ok(envelope.user)
    }

    /// Revoke a token server-side.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn logout(&self, token: &SecretString) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .post::<(), _>(self.url(&["api", "auth", "logout"])?, None, Some(token))
            .await?;
        Ok(())
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Submit a cash-on-delivery order. Guests may order without a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the order is rejected.
    #[instrument(skip_all, fields(lines = payload.items.len()))]
    pub async fn create_order(
        &self,
        payload: &crate::checkout::OrderPayload,
        token: Option<&SecretString>,
    ) -> Result<OrderConfirmation, ApiError> {
        self.post(self.url(&["api", "orders"])?, Some(payload), token)
            .await
    }

    /// Orders placed by the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotAuthenticated` without a token, or an error if
    /// the API request fails.
    #[instrument(skip_all)]
    pub async fn my_orders(&self, token: Option<&SecretString>) -> Result<Vec<Order>, ApiError> {
        let token = token.ok_or(ApiError::NotAuthenticated)?;
        let envelope: OrdersEnvelope = self
            .get(self.url(&["api", "orders", "my"])?, Some(token))
            .await?;
        Ok(envelope.orders)
    }

    // =========================================================================
    // Rewards Methods
    // =========================================================================

    /// Loyalty balance for the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotAuthenticated` without a token, or an error if
    /// the API request fails.
    #[instrument(skip_all)]
    pub async fn reward_balance(
        &self,
        token: Option<&SecretString>,
    ) -> Result<RewardBalance, ApiError> {
        let token = token.ok_or(ApiError::NotAuthenticated)?;
        self.get(self.url(&["api", "rewards", "balance"])?, Some(token))
            .await
    }

    /// Loyalty ledger for the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotAuthenticated` without a token, or an error if
    /// the API request fails.
    #[instrument(skip_all)]
    pub async fn reward_history(
        &self,
        token: Option<&SecretString>,
    ) -> Result<Vec<RewardEntry>, ApiError> {
        let token = token.ok_or(ApiError::NotAuthenticated)?;
        let envelope: HistoryEnvelope = self
            .get(self.url(&["api", "rewards", "history"])?, Some(token))
            .await?;
        Ok(envelope.history)
    }

    // =========================================================================
    // Admin Methods
    // =========================================================================

    /// Every order in the store, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotAuthenticated` without a token, or an error if
    /// the API request fails or the account is not an admin.
    #[instrument(skip_all)]
    pub async fn admin_orders(&self, token: Option<&SecretString>) -> Result<Vec<Order>, ApiError> {
        let token = token.ok_or(ApiError::NotAuthenticated)?;
        let envelope: OrdersEnvelope = self
            .get(self.url(&["api", "admin", "orders"])?, Some(token))
            .await?;
        Ok(envelope.orders)
    }

    /// Every registered account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotAuthenticated` without a token, or an error if
    /// the API request fails or the account is not an admin.
    #[instrument(skip_all)]
    pub async fn admin_users(&self, token: Option<&SecretString>) -> Result<Vec<User>, ApiError> {
        let token = token.ok_or(ApiError::NotAuthenticated)?;
        let envelope: UsersEnvelope = self
            .get(self.url(&["api", "admin", "users"])?, Some(token))
            .await?;
        Ok(envelope.users)
    }

    /// Move an order to a new status and return the updated order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotAuthenticated` without a token, or an error if
    /// the API request fails or the backend rejects the change.
    #[instrument(skip(self, token), fields(order = %order))]
    pub async fn update_order_status(
        &self,
        order: &OrderId,
        status: OrderStatus,
        token: Option<&SecretString>,
    ) -> Result<Order, ApiError> {
        let token = token.ok_or(ApiError::NotAuthenticated)?;
        let id = order.normalized();
        let url = self.url(&["api", "admin", "orders", &id, "status"])?;
        let envelope: OrderEnvelope = self
            .post(url, Some(&StatusUpdate { status }), Some(token))
            .await?;
        Ok(envelope.order)
    }

    /// Grant or revoke admin rights.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotAuthenticated` without a token, or an error if
    /// the API request fails or the account is not an admin.
    #[instrument(skip(self, token), fields(user = %user))]
    pub async fn set_user_admin(
        &self,
        user: &UserId,
        is_admin: bool,
        token: Option<&SecretString>,
    ) -> Result<(), ApiError> {
        let token = token.ok_or(ApiError::NotAuthenticated)?;
        let id = user.normalized();
        let url = self.url(&["api", "auth", "users", &id, "admin"])?;
        let _: serde_json::Value = self
            .post(url, Some(&AdminGrant { is_admin }), Some(token))
            .await?;
        Ok(())
    }

    /// Open the admin feed of order events.
    ///
    /// The token travels in the query string as well as the `Authorization`
    /// header, since browser event sources cannot set headers.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotAuthenticated` without a token, or an error if
    /// the feed cannot be opened. Errors while reading are yielded by the
    /// stream.
    #[instrument(skip_all)]
    pub async fn admin_events(
        &self,
        token: Option<&SecretString>,
    ) -> Result<impl Stream<Item = Result<AdminEvent, ApiError>> + Send, ApiError> {
        let token = token.ok_or(ApiError::NotAuthenticated)?;
        let mut url = self.url(&["api", "admin", "events"])?;
        url.query_pairs_mut()
            .append_pair("token", token.expose_secret());

        let response = self
            .inner
            .feed_client
            .get(url)
            .bearer_auth(token.expose_secret())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            let value: Option<serde_json::Value> = serde_json::from_str(&body).ok();
            return Err(api_error(status.as_u16(), value.as_ref()));
        }

        debug!("Admin feed opened");
        Ok(events::admin_event_stream(response))
    }

    // =========================================================================
    // Contact
    // =========================================================================

    /// Send a contact-form message.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn submit_contact(&self, message: &ContactMessage) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .post(self.url(&["api", "contact"])?, Some(message), None)
            .await?;
        Ok(())
    }
}

/// Turn a response into `T`, mapping failures to [`ApiError::Api`].
///
/// A 2xx body with `"ok": false` is treated as a failure too.
async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    decode_body(status.as_u16(), status.is_success(), &body)
}

fn decode_body<T: DeserializeOwned>(status: u16, success: bool, body: &str) -> Result<T, ApiError> {
    let value: Option<serde_json::Value> = serde_json::from_str(body).ok();

    let rejected = value
        .as_ref()
        .and_then(|v| v.get("ok"))
        .and_then(serde_json::Value::as_bool)
        == Some(false);

    if !success || rejected {
        return Err(api_error(status, value.as_ref()));
    }

    match value {
        Some(v) => serde_json::from_value(v).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse storefront API response"
            );
            ApiError::Parse(e)
        }),
        None => serde_json::from_str(body).map_err(ApiError::Parse),
    }
}

/// The backend's `error` message, or `API error: <status>` without one.
fn api_error(status: u16, body: Option<&serde_json::Value>) -> ApiError {
    let message = body
        .and_then(|v| v.get("error"))
        .and_then(serde_json::Value::as_str)
        .map_or_else(|| format!("API error: {status}"), str::to_string);
    tracing::warn!(status, %message, "Storefront API returned an error");
    ApiError::Api { status, message }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config(base: &str) -> StorefrontConfig {
        StorefrontConfig {
            api_base: Url::parse(base).unwrap(),
            storage_dir: ".kos-test".into(),
            catalog_cache_ttl: Duration::from_secs(60),
            http_timeout: Duration::from_secs(1),
            log_format: crate::config::LogFormat::Pretty,
        }
    }

    #[test]
    fn test_url_encodes_segments() {
        let api = ApiClient::new(&config("https://api.example.qa")).unwrap();
        let url = api
            .url(&["api", "products", "Rose Water/100ml", "reviews"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.qa/api/products/Rose%20Water%2F100ml/reviews"
        );
    }

    #[test]
    fn test_url_keeps_base_path_prefix() {
        let api = ApiClient::new(&config("https://example.qa/shop/")).unwrap();
        let url = api.url(&["api", "categories"]).unwrap();
        assert_eq!(url.as_str(), "https://example.qa/shop/api/categories");
    }

    #[test]
    fn test_decode_error_body_message() {
        let body = r#"{"ok":false,"error":"Email taken"}"#;
        let err = decode_body::<serde_json::Value>(409, false, body).unwrap_err();
        match err {
            ApiError::Api { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "Email taken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_error_without_body() {
        let err =
            decode_body::<serde_json::Value>(502, false, "<html>Bad gateway</html>").unwrap_err();
        assert_eq!(err.to_string(), "API error: 502");
    }

    #[test]
    fn test_decode_ok_false_on_success_status() {
        let body = r#"{"ok":false,"error":"Out of stock"}"#;
        let err = decode_body::<serde_json::Value>(200, true, body).unwrap_err();
        assert_eq!(err.to_string(), "Out of stock");
    }

    #[test]
    fn test_decode_products() {
        let envelope: ProductsEnvelope = decode_body(
            200,
            true,
            r#"{"ok":true,"products":[{"id":1,"name":"Serum","price":30}]}"#,
        )
        .unwrap();
        assert_eq!(envelope.products.len(), 1);
        assert_eq!(envelope.products[0].name, "Serum");
    }

    #[tokio::test]
    async fn test_protected_calls_require_token() {
        let api = ApiClient::new(&config("http://127.0.0.1:9")).unwrap();
        assert!(matches!(
            api.my_orders(None).await,
            Err(ApiError::NotAuthenticated)
        ));
        assert!(matches!(
            api.reward_balance(None).await,
            Err(ApiError::NotAuthenticated)
        ));
        assert!(matches!(
            api.reward_history(None).await,
            Err(ApiError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_admin_calls_require_token() {
        let api = ApiClient::new(&config("http://127.0.0.1:9")).unwrap();
        assert!(matches!(
            api.admin_orders(None).await,
            Err(ApiError::NotAuthenticated)
        ));
        assert!(matches!(
            api.admin_users(None).await,
            Err(ApiError::NotAuthenticated)
        ));
        assert!(matches!(
            api.update_order_status(&OrderId::from(1), OrderStatus::Shipped, None)
                .await,
            Err(ApiError::NotAuthenticated)
        ));
        assert!(matches!(
            api.set_user_admin(&UserId::from(5), true, None).await,
            Err(ApiError::NotAuthenticated)
        ));
        assert!(matches!(
            api.admin_events(None).await,
            Err(ApiError::NotAuthenticated)
        ));
    }
}
