//! Cart commands.

use std::fmt::Write as _;

use clap::Subcommand;
use kos_core::{ProductId, format_price};
use kos_storefront::cart::CartLineItem;
use kos_storefront::error::AppError;
use kos_storefront::state::AppState;
use rust_decimal::Decimal;

use super::{find_product, report};

#[derive(Debug, Subcommand)]
pub enum CartAction {
    /// Show the cart
    List,
    /// Add a product (looked up in the catalog)
    Add {
        /// Product id
        id: ProductId,
        /// How many to add (default 1)
        #[arg(short, long, allow_negative_numbers = true)]
        qty: Option<i64>,
    },
    /// Remove a product
    Remove {
        /// Product id
        id: ProductId,
    },
    /// Set a product's quantity; zero removes it
    SetQty {
        /// Product id
        id: ProductId,
        /// New quantity
        #[arg(allow_negative_numbers = true)]
        qty: i64,
    },
    /// Empty the cart
    Clear,
}

/// Run a cart command.
///
/// # Errors
///
/// Returns an error if the product lookup for `add` fails.
pub async fn run(state: &AppState, action: CartAction) -> Result<(), AppError> {
    let cart = state.cart();
    match action {
        CartAction::List => {}
        CartAction::Add { id, qty } => {
            let product = find_product(state, &id).await?;
            cart.add_item(product.to_cart_item(), qty);
        }
        CartAction::Remove { id } => cart.remove_item(&id),
        CartAction::SetQty { id, qty } => cart.set_qty(&id, qty),
        CartAction::Clear => cart.clear(),
    }
    report(&render_cart(&cart.items(), cart.total_quantity(), cart.total_price()));
    Ok(())
}

/// Format the cart as a table with totals.
pub fn render_cart(items: &[CartLineItem], quantity: u64, total: Decimal) -> String {
    if items.is_empty() {
        return "Your cart is empty.".to_string();
    }

    let mut out = String::new();
    for line in items {
        let currency = line.currency.as_deref();
        let _ = writeln!(
            out,
            "{:>4} x {:<32} {:>14}  (id {})",
            line.qty,
            line.name,
            format_price(line.line_total(), currency),
            line.id
        );
    }
    let _ = write!(
        out,
        "{quantity} item(s), total {}",
        format_price(total, items.first().and_then(|l| l.currency.as_deref()))
    );
    out
}

#[cfg(test)]
mod tests {
    use kos_storefront::cart::{CartCommand, CartState, NewCartItem};

    use super::*;

    #[test]
    fn test_render_empty_cart() {
        assert_eq!(render_cart(&[], 0, Decimal::ZERO), "Your cart is empty.");
    }

    #[test]
    fn test_render_cart_lines_and_total() {
        let state = CartState::default()
            .apply(CartCommand::AddItem {
                item: NewCartItem::new(1, "Serum", Decimal::from(30)),
                qty: Some(2),
            })
            .apply(CartCommand::AddItem {
                item: NewCartItem::new(2, "Cream", Decimal::new(455, 1)),
                qty: None,
            });

        let out = render_cart(state.items(), state.total_quantity(), state.total_price());

        assert!(out.contains("Serum"));
        assert!(out.contains("QAR 60.00"));
        assert!(out.contains("QAR 45.50"));
        assert!(out.ends_with("3 item(s), total QAR 105.50"));
    }
}
