//! Wishlist commands.

use std::fmt::Write as _;

use clap::Subcommand;
use kos_core::{ProductId, format_price};
use kos_storefront::error::AppError;
use kos_storefront::state::AppState;
use kos_storefront::wishlist::WishlistItem;

use super::{find_product, report};

#[derive(Debug, Subcommand)]
pub enum WishlistAction {
    /// Show saved products
    List,
    /// Save a product (looked up in the catalog)
    Add {
        /// Product id
        id: ProductId,
    },
    /// Forget a saved product
    Remove {
        /// Product id
        id: ProductId,
    },
    /// Save the product, or forget it if already saved
    Toggle {
        /// Product id
        id: ProductId,
    },
    /// Forget all saved products
    Clear,
}

/// Run a wishlist command.
///
/// # Errors
///
/// Returns an error if a catalog lookup fails.
pub async fn run(state: &AppState, action: WishlistAction) -> Result<(), AppError> {
    let wishlist = state.wishlist();
    match action {
        WishlistAction::List => {}
        WishlistAction::Add { id } => {
            if !wishlist.is_in_wishlist(&id) {
                let product = find_product(state, &id).await?;
                wishlist.add(product.to_wishlist_item());
            }
        }
        WishlistAction::Remove { id } => wishlist.remove(&id),
        WishlistAction::Toggle { id } => {
            // A saved entry is enough to toggle it off without the network.
            let saved = wishlist
                .items()
                .into_iter()
                .find(|item| item.id.same_as(&id));
            let item = match saved {
                Some(item) => item,
                None => find_product(state, &id).await?.to_wishlist_item(),
            };
            let now_saved = wishlist.toggle(item);
            report(if now_saved { "Saved." } else { "Removed." });
        }
        WishlistAction::Clear => wishlist.clear(),
    }
    report(&render_wishlist(&wishlist.items()));
    Ok(())
}

pub fn render_wishlist(items: &[WishlistItem]) -> String {
    if items.is_empty() {
        return "Your wishlist is empty.".to_string();
    }
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(
            out,
            "{:<32} {:>14}  (id {})",
            item.name,
            format_price(item.price, None),
            item.id
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_render_wishlist() {
        assert_eq!(render_wishlist(&[]), "Your wishlist is empty.");

        let out = render_wishlist(&[
            WishlistItem::new(1, "Serum", Decimal::from(30)),
            WishlistItem::new("lip-oil", "Lip oil", Decimal::new(2250, 2)),
        ]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("QAR 22.50"));
        assert!(lines[1].contains("(id lip-oil)"));
    }
}
