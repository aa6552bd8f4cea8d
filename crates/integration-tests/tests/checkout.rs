//! Order placement end to end: cart on disk, session, backend.

#![allow(clippy::unwrap_used)]

use kos_core::ProductId;
use kos_integration_tests::{FakeBackend, OUT_OF_STOCK_ID, TEST_PASSWORD, TestContext};
use kos_storefront::api::LoginRequest;
use kos_storefront::checkout::{CheckoutError, CustomerDetails, place_order};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::json;

fn customer() -> CustomerDetails {
    CustomerDetails {
        name: "Mariam".to_string(),
        phone: "+974 5555 0000".to_string(),
        email: Some("mariam@example.qa".to_string()),
        address: "Street 12, Building 4".to_string(),
        city: "Doha".to_string(),
        postal: None,
        note: Some("Call on arrival".to_string()),
    }
}

#[tokio::test]
async fn test_guest_checkout_clears_persisted_cart() {
    let backend = FakeBackend::start().await;
    let ctx = TestContext::with_api_base(&backend.base_url());
    let state = ctx.state();

    let serum = state
        .api()
        .find_product(&ProductId::from(1))
        .await
        .unwrap()
        .unwrap();
    state.cart().add_item(serum.to_cart_item(), Some(2));

    let confirmation = place_order(
        state.api(),
        state.cart(),
        state.session(),
        customer(),
        Some(100),
    )
    .await
    .unwrap();

    assert_eq!(confirmation.order.unwrap().totals.total, Decimal::from(60));
    assert!(confirmation.rewards.is_none());
    assert!(ctx.state().cart().items().is_empty());

    let orders = backend.orders();
    let (body, token) = &orders[0];
    assert!(token.is_none());
    assert!(body.get("rewards").is_none());
    assert_eq!(body["payment"], json!({"method": "cod"}));
    assert_eq!(body["totals"], json!({"subtotal": 60, "shipping": 0, "total": 60}));
    assert_eq!(body["customer"]["note"], "Call on arrival");
}

#[tokio::test]
async fn test_signed_in_checkout_redeems_points() {
    let backend = FakeBackend::start().await;
    let ctx = TestContext::with_api_base(&backend.base_url());
    let state = ctx.state();

    let grant = state
        .api()
        .login(&LoginRequest {
            email: Some("mariam@example.qa".to_string()),
            username: None,
            password: SecretString::from(TEST_PASSWORD.to_string()),
        })
        .await
        .unwrap();
    state.session().set(grant.token);

    let cream = state
        .api()
        .find_product(&ProductId::from(2))
        .await
        .unwrap()
        .unwrap();
    state.cart().add_item(cream.to_cart_item(), None);

    // A restart between login and checkout keeps the session.
    let state = ctx.state();
    let confirmation = place_order(
        state.api(),
        state.cart(),
        state.session(),
        customer(),
        Some(100),
    )
    .await
    .unwrap();

    let rewards = confirmation.rewards.unwrap();
    assert_eq!(rewards.earned_points, 60);
    assert_eq!(rewards.applied_discount_qar, Decimal::from(5));

    let orders = backend.orders();
    let (body, token) = &orders[0];
    assert!(token.is_some());
    assert_eq!(body["rewards"], json!({"redeemPoints": 100}));
    assert_eq!(body["items"][0]["price"], json!(45.5));
}

#[tokio::test]
async fn test_rejected_order_keeps_cart_on_disk() {
    let backend = FakeBackend::start().await;
    let ctx = TestContext::with_api_base(&backend.base_url());
    let state = ctx.state();

    let palette = state
        .api()
        .find_product(&ProductId::from(OUT_OF_STOCK_ID))
        .await
        .unwrap()
        .unwrap();
    state.cart().add_item(palette.to_cart_item(), None);

    let err = place_order(state.api(), state.cart(), state.session(), customer(), None)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Limited palette is out of stock");
    assert_eq!(ctx.state().cart().total_quantity(), 1);
}

#[tokio::test]
async fn test_empty_cart_is_not_submitted() {
    let backend = FakeBackend::start().await;
    let ctx = TestContext::with_api_base(&backend.base_url());
    let state = ctx.state();

    let err = place_order(state.api(), state.cart(), state.session(), customer(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::EmptyCart));
    assert!(backend.orders().is_empty());
}
