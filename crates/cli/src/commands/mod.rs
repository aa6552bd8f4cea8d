//! CLI command implementations.
//!
//! Each module renders its output to a `String` so formatting can be tested
//! without capturing stdout; [`report`] is the single place that prints.

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod wishlist;

use kos_core::ProductId;
use kos_storefront::api::Product;
use kos_storefront::error::AppError;
use kos_storefront::state::AppState;

/// Print command output for the user.
#[allow(clippy::print_stdout)]
pub fn report(output: &str) {
    println!("{output}");
}

/// Look a product up in the catalog by id.
async fn find_product(state: &AppState, id: &ProductId) -> Result<Product, AppError> {
    state
        .api()
        .find_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}
