//! Cash-on-delivery checkout.
//!
//! Turns a cart snapshot into an order payload, submits it, and clears the
//! cart once the backend accepts the order. A rejected order leaves the cart
//! untouched so the customer can retry.

use std::future::Future;

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use kos_core::PaymentMethod;

use crate::api::{ApiClient, ApiError, OrderConfirmation, OrderLine, OrderTotals, RewardBalance};
use crate::cart::{CartState, CartStore};
use crate::session::AuthSession;

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty.")]
    EmptyCart,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Delivery and contact details entered at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub address: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CustomerDetails {
    /// Check that the fields needed for delivery are filled in.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingField` naming the first blank field.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let required = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
        ];
        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(CheckoutError::MissingField(*field)),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    pub redeem_points: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentDetails {
    pub method: PaymentMethod,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderPayload {
    pub customer: CustomerDetails,
    pub items: Vec<OrderLine>,
    pub totals: OrderTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewards: Option<RedeemRequest>,
    pub payment: PaymentDetails,
}

impl OrderPayload {
    /// Build a payload from the cart. Shipping is always free.
    ///
    /// `redeem_points` is only sent for signed-in customers; pass `None` for
    /// guests.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if the cart has no lines.
    pub fn from_cart(
        cart: &CartState,
        customer: CustomerDetails,
        redeem_points: Option<u64>,
    ) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let subtotal = cart.total_price();
        Ok(Self {
            customer,
            items: cart.items().iter().map(OrderLine::from).collect(),
            totals: OrderTotals {
                subtotal,
                shipping: Decimal::ZERO,
                total: subtotal,
            },
            rewards: redeem_points.map(|redeem_points| RedeemRequest { redeem_points }),
            payment: PaymentDetails {
                method: PaymentMethod::Cod,
            },
        })
    }
}

/// Where orders are sent.
pub trait OrderGateway: Send + Sync {
    fn submit_order(
        &self,
        payload: &OrderPayload,
        token: Option<&SecretString>,
    ) -> impl Future<Output = Result<OrderConfirmation, ApiError>> + Send;
}

impl OrderGateway for ApiClient {
    fn submit_order(
        &self,
        payload: &OrderPayload,
        token: Option<&SecretString>,
    ) -> impl Future<Output = Result<OrderConfirmation, ApiError>> + Send {
        self.create_order(payload, token)
    }
}

/// Place an order for the current cart contents.
///
/// Signed-in customers send their bearer token and a points redemption
/// (zero if `redeem_points` is `None`). The cart is cleared only after the
/// backend accepts the order.
///
/// # Errors
///
/// Returns `CheckoutError` if validation fails, the cart is empty, or the
/// backend rejects the order.
#[instrument(skip_all)]
pub async fn place_order<G: OrderGateway>(
    gateway: &G,
    cart: &CartStore,
    session: &AuthSession,
    customer: CustomerDetails,
    redeem_points: Option<u64>,
) -> Result<OrderConfirmation, CheckoutError> {
    customer.validate()?;

    let token = session.token();
    let redeem = token.as_ref().map(|_| redeem_points.unwrap_or(0));
    let payload = OrderPayload::from_cart(&cart.snapshot(), customer, redeem)?;

    match gateway.submit_order(&payload, token.as_ref()).await {
        Ok(confirmation) => {
            cart.clear();
            info!(
                lines = payload.items.len(),
                total = %payload.totals.total,
                "Order placed"
            );
            Ok(confirmation)
        }
        Err(e) => {
            warn!(error = %e, "Order rejected");
            Err(e.into())
        }
    }
}

/// Points and discount a redemption would apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedeemPreview {
    pub points: u64,
    pub discount: Decimal,
}

impl RewardBalance {
    /// Estimate a redemption against an order subtotal.
    ///
    /// Points are clamped to the balance; the discount is capped at
    /// `max_redeem_pct` of the subtotal. The backend has the final say.
    #[must_use]
    pub fn redeem_preview(&self, points: u64, subtotal: Decimal) -> RedeemPreview {
        let available = u64::try_from(self.points).unwrap_or(0);
        let points = points.min(available);
        let discount = (Decimal::from(points) * self.redeem_rate)
            .min(subtotal.max(Decimal::ZERO) * self.max_redeem_pct)
            .max(Decimal::ZERO)
            .round_dp(2);
        RedeemPreview { points, discount }
    }
}
