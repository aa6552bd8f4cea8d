//! Domain types for the storefront REST API.
//!
//! Field names follow the backend's JSON (camelCase); prices are read
//! leniently the same way the local stores read them.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use kos_core::{CategoryId, OrderId, OrderStatus, ProductId, RewardEntryKind, ReviewId, UserId};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use crate::cart::{CartLineItem, NewCartItem};
use crate::wishlist::WishlistItem;

// =============================================================================
// Catalog Types
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: Option<ProductId>,
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "kos_core::price::lenient")]
    pub price: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// 128px thumbnail, base64-encoded PNG.
    #[serde(default, rename = "image_128")]
    pub image_128: Option<String>,
}

impl Product {
    /// The key this product is filed under in the cart and wishlist.
    #[must_use]
    pub fn key(&self) -> ProductId {
        ProductId::or_name(self.id.clone(), &self.name)
    }

    /// Thumbnail as a `data:` URL, if the product has a decodable one.
    #[must_use]
    pub fn image_url(&self) -> Option<String> {
        let encoded = self.image_128.as_deref()?.trim();
        if encoded.is_empty() || STANDARD.decode(encoded).is_err() {
            return None;
        }
        Some(format!("data:image/png;base64,{encoded}"))
    }

    /// The product as a cart entry.
    #[must_use]
    pub fn to_cart_item(&self) -> NewCartItem {
        NewCartItem {
            id: self.key(),
            name: self.name.clone(),
            price: self.price,
            currency: self.currency.clone(),
            img: self.image_url(),
        }
    }

    /// The product as a wishlist entry.
    #[must_use]
    pub fn to_wishlist_item(&self) -> WishlistItem {
        WishlistItem {
            id: self.key(),
            name: self.name.clone(),
            price: self.price,
            img: self.image_url(),
        }
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Result ordering for product search. Relevance is the backend default and
/// has no wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::NameAsc => "name_asc",
            Self::NameDesc => "name_desc",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "name_asc" => Ok(Self::NameAsc),
            "name_desc" => Ok(Self::NameDesc),
            other => Err(format!(
                "unknown sort '{other}' (expected price_asc, price_desc, name_asc or name_desc)"
            )),
        }
    }
}

/// Product search filters. Unset fields are left out of the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub q: Option<String>,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
    pub category_id: Option<CategoryId>,
    pub in_stock: Option<bool>,
    pub sort: Option<SortOrder>,
    pub limit: Option<u32>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            q: None,
            min: None,
            max: None,
            category_id: None,
            in_stock: None,
            sort: None,
            limit: Some(200),
        }
    }
}

impl ProductQuery {
    /// Query-string pairs in the order the backend documents them.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(q) = self.q.as_deref().filter(|q| !q.is_empty()) {
            pairs.push(("q", q.to_string()));
        }
        if let Some(min) = self.min {
            pairs.push(("min", min.to_string()));
        }
        if let Some(max) = self.max {
            pairs.push(("max", max.to_string()));
        }
        if let Some(category) = &self.category_id {
            pairs.push(("categoryId", category.to_string()));
        }
        if let Some(in_stock) = self.in_stock {
            pairs.push(("inStock", if in_stock { "1" } else { "0" }.to_string()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort", sort.as_str().to_string()));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

// =============================================================================
// Review Types
// =============================================================================

/// A product review.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub id: Option<ReviewId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// A review to submit.
#[derive(Debug, Clone, Serialize)]
pub struct NewReview {
    pub name: String,
    pub text: String,
    /// 1 to 5 stars.
    pub rating: u8,
}

// =============================================================================
// Account Types
// =============================================================================

/// The signed-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    /// Only reported in admin user listings.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Sign-up request.
#[derive(Debug, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
}

/// Login request; either `email` or `username` identifies the account.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
}

/// Issued credential and the account it belongs to.
#[derive(Debug, Deserialize)]
pub struct AuthGrant {
    #[serde(deserialize_with = "secret_from_string")]
    pub token: SecretString,
    pub user: User,
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn secret_from_string<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

// =============================================================================
// Order Types
// =============================================================================

/// One line of an order, as sent at checkout and as listed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "kos_core::price::lenient")]
    pub price: Decimal,
    #[serde(default = "one")]
    pub qty: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

const fn one() -> u32 {
    1
}

impl From<&CartLineItem> for OrderLine {
    fn from(line: &CartLineItem) -> Self {
        Self {
            id: line.id.clone(),
            name: line.name.clone(),
            price: line.price,
            qty: line.qty,
            currency: line.currency.clone(),
        }
    }
}

/// Order totals. Shipping is always zero for cash-on-delivery orders.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderTotals {
    #[serde(default, with = "kos_core::price::lenient")]
    pub subtotal: Decimal,
    #[serde(default, with = "kos_core::price::lenient")]
    pub shipping: Decimal,
    #[serde(default, with = "kos_core::price::lenient")]
    pub total: Decimal,
}

/// Who an order is for, as shown to admins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct OrderCustomer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub customer: Option<OrderCustomer>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub totals: OrderTotals,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, alias = "createdAt")]
    pub date: Option<DateTime<Utc>>,
}

/// Loyalty outcome reported when an order is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardsApplied {
    #[serde(default)]
    pub earned_points: i64,
    #[serde(default)]
    pub applied_redeem_points: i64,
    #[serde(default, with = "kos_core::price::lenient")]
    pub applied_discount_qar: Decimal,
}

/// Response to a successful order submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct OrderConfirmation {
    #[serde(default)]
    pub order: Option<Order>,
    #[serde(default)]
    pub rewards: Option<RewardsApplied>,
}

// =============================================================================
// Rewards Types
// =============================================================================

/// Loyalty balance and programme parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RewardBalance {
    pub points: i64,
    pub tier: String,
    /// Points earned per currency unit spent.
    #[serde(with = "kos_core::price::lenient")]
    pub earn_rate: Decimal,
    /// Currency value of one point.
    #[serde(with = "kos_core::price::lenient")]
    pub redeem_rate: Decimal,
    /// Largest fraction of an order payable with points.
    #[serde(with = "kos_core::price::lenient")]
    pub max_redeem_pct: Decimal,
    pub expiry_months: u32,
    pub next_expiry_at: Option<DateTime<Utc>>,
}

impl Default for RewardBalance {
    fn default() -> Self {
        Self {
            points: 0,
            tier: "Bronze".to_string(),
            earn_rate: Decimal::ONE,
            redeem_rate: Decimal::new(5, 2),
            max_redeem_pct: Decimal::new(5, 1),
            expiry_months: 24,
            next_expiry_at: None,
        }
    }
}

/// One movement in the loyalty ledger.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardEntry {
    #[serde(rename = "type")]
    pub kind: RewardEntryKind,
    pub delta: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Admin Types
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct StatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AdminGrant {
    pub is_admin: bool,
}

// =============================================================================
// Contact Types
// =============================================================================

/// Contact form submission.
#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

// =============================================================================
// Response Envelopes
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ProductsEnvelope {
    #[serde(default)]
    pub products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoriesEnvelope {
    #[serde(default)]
    pub categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewsEnvelope {
    #[serde(default)]
    pub reviews: Vec<Review>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewEnvelope {
    pub review: Review,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrdersEnvelope {
    #[serde(default)]
    pub orders: Vec<Order>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderEnvelope {
    pub order: Order,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsersEnvelope {
    #[serde(default)]
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryEnvelope {
    #[serde(default)]
    pub history: Vec<RewardEntry>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_product_key_falls_back_to_name() {
        let product: Product =
            serde_json::from_value(json!({"name": "Clay Mask", "price": 40})).unwrap();
        assert_eq!(product.key(), ProductId::from("Clay Mask"));
    }

    #[test]
    fn test_product_image_url() {
        let product: Product = serde_json::from_value(
            json!({"id": 5, "name": "Balm", "price": 12, "image_128": "iVBORw0KGgo="}),
        )
        .unwrap();
        assert_eq!(
            product.image_url().as_deref(),
            Some("data:image/png;base64,iVBORw0KGgo=")
        );

        let broken: Product = serde_json::from_value(
            json!({"id": 6, "name": "Balm", "price": 12, "image_128": "%%%"}),
        )
        .unwrap();
        assert_eq!(broken.image_url(), None);
    }

    #[test]
    fn test_product_to_cart_item() {
        let product: Product = serde_json::from_value(
            json!({"id": 9, "name": "Cleanser", "price": 55.5, "currency": "QAR"}),
        )
        .unwrap();
        let item = product.to_cart_item();
        assert_eq!(item.id, ProductId::from(9));
        assert_eq!(item.price, Decimal::new(555, 1));
        assert_eq!(item.currency.as_deref(), Some("QAR"));
        assert_eq!(item.img, None);
    }

    #[test]
    fn test_query_pairs() {
        let query = ProductQuery {
            q: Some("serum".into()),
            max: Some(Decimal::from(100)),
            category_id: Some(CategoryId::from(3)),
            in_stock: Some(true),
            sort: Some(SortOrder::PriceAsc),
            ..ProductQuery::default()
        };
        assert_eq!(
            query.to_pairs(),
            vec![
                ("q", "serum".to_string()),
                ("max", "100".to_string()),
                ("categoryId", "3".to_string()),
                ("inStock", "1".to_string()),
                ("sort", "price_asc".to_string()),
                ("limit", "200".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_search_term_is_omitted() {
        let query = ProductQuery {
            q: Some(String::new()),
            limit: None,
            ..ProductQuery::default()
        };
        assert!(query.to_pairs().is_empty());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("name_desc".parse::<SortOrder>().unwrap(), SortOrder::NameDesc);
        assert!("relevance".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_login_request_exposes_password_only_on_wire() {
        let request = LoginRequest {
            email: Some("layla@example.qa".into()),
            username: None,
            password: SecretString::from("hunter2-but-longer".to_string()),
        };
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(
            wire,
            json!({"email": "layla@example.qa", "password": "hunter2-but-longer"})
        );
        assert!(!format!("{request:?}").contains("hunter2"));
    }

    #[test]
    fn test_order_accepts_created_at() {
        let order: Order = serde_json::from_value(json!({
            "id": "ord_77",
            "items": [{"id": 1, "name": "Serum", "price": 30, "qty": 2}],
            "totals": {"subtotal": 60, "shipping": 0, "total": 60},
            "status": "confirmed",
            "createdAt": "2026-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(order.id, OrderId::from("ord_77"));
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.totals.total, Decimal::from(60));
        assert!(order.date.is_some());
    }

    #[test]
    fn test_admin_order_carries_customer() {
        let order: Order = serde_json::from_value(json!({
            "id": 12,
            "customer": {"name": "Mariam", "phone": "+974 5555 0000", "city": "Doha"},
            "totals": {"total": 60},
            "status": "placed"
        }))
        .unwrap();
        let customer = order.customer.unwrap();
        assert_eq!(customer.name, "Mariam");
        assert_eq!(customer.phone, "+974 5555 0000");
    }

    #[test]
    fn test_admin_requests_wire_shape() {
        assert_eq!(
            serde_json::to_value(StatusUpdate {
                status: OrderStatus::Shipped
            })
            .unwrap(),
            json!({"status": "shipped"})
        );
        assert_eq!(
            serde_json::to_value(AdminGrant { is_admin: true }).unwrap(),
            json!({"isAdmin": true})
        );
    }

    #[test]
    fn test_reward_balance_defaults() {
        let balance: RewardBalance = serde_json::from_value(json!({"points": 120})).unwrap();
        assert_eq!(balance.points, 120);
        assert_eq!(balance.tier, "Bronze");
        assert_eq!(balance.redeem_rate, Decimal::new(5, 2));
    }

    #[test]
    fn test_reward_entry_kind_from_type() {
        let entry: RewardEntry = serde_json::from_value(
            json!({"type": "earn", "delta": 60, "createdAt": "2026-02-11T08:30:00Z"}),
        )
        .unwrap();
        assert_eq!(entry.kind, RewardEntryKind::Earn);
        assert_eq!(entry.delta, 60);
    }
}
