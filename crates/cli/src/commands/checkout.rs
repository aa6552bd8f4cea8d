//! Checkout command.

use clap::Args;
use kos_core::format_price;
use kos_storefront::api::OrderConfirmation;
use kos_storefront::checkout::{CustomerDetails, place_order};
use kos_storefront::error::AppError;
use kos_storefront::state::AppState;
use tracing::warn;

use super::report;

#[derive(Debug, Args)]
pub struct CheckoutArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub address: String,
    #[arg(long)]
    pub city: String,
    #[arg(long)]
    pub postal: Option<String>,
    /// Delivery note
    #[arg(long)]
    pub note: Option<String>,
    /// Loyalty points to redeem (signed-in customers only)
    #[arg(long)]
    pub redeem: Option<u64>,
}

impl From<CheckoutArgs> for CustomerDetails {
    fn from(args: CheckoutArgs) -> Self {
        Self {
            name: args.name,
            phone: args.phone,
            email: args.email,
            address: args.address,
            city: args.city,
            postal: args.postal,
            note: args.note,
        }
    }
}

/// Place a cash-on-delivery order for the current cart.
///
/// # Errors
///
/// Returns an error if the details are incomplete, the cart is empty, or the
/// order is rejected. The cart is kept in every error case.
pub async fn run(state: &AppState, args: CheckoutArgs) -> Result<(), AppError> {
    let redeem = args.redeem;

    if let Some(points) = redeem
        && state.session().is_authenticated()
    {
        // Preview only; the backend applies its own limits.
        match state.api().reward_balance(state.session().token().as_ref()).await {
            Ok(balance) => {
                let preview = balance.redeem_preview(points, state.cart().total_price());
                report(&format!(
                    "Redeeming {} pts (about -{})",
                    preview.points,
                    format_price(preview.discount, None)
                ));
            }
            Err(e) => warn!(error = %e, "Could not preview points redemption"),
        }
    }

    let confirmation = place_order(
        state.api(),
        state.cart(),
        state.session(),
        args.into(),
        redeem,
    )
    .await?;
    report(&render_confirmation(&confirmation));
    Ok(())
}

fn render_confirmation(confirmation: &OrderConfirmation) -> String {
    let mut out = "Order placed! Pay cash on delivery.".to_string();
    if let Some(order) = &confirmation.order {
        out.push_str(&format!(" Order #{}.", order.id));
    }
    if let Some(rewards) = &confirmation.rewards {
        out.push_str(&format!(" Earned {} pts", rewards.earned_points));
        if rewards.applied_discount_qar > rust_decimal::Decimal::ZERO {
            out.push_str(&format!(
                ", used {} pts (-{})",
                rewards.applied_redeem_points,
                format_price(rewards.applied_discount_qar, None)
            ));
        }
        out.push('.');
    }
    out
}
