//! Catalog browsing and reviews.

use std::fmt::Write as _;

use clap::Args;
use kos_core::{CategoryId, ProductId, format_price};
use kos_storefront::api::{NewReview, Product, ProductQuery, Review, SortOrder};
use kos_storefront::error::AppError;
use kos_storefront::state::AppState;
use rust_decimal::Decimal;

use super::report;

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Text to search for
    #[arg(long)]
    pub q: Option<String>,
    /// Minimum price
    #[arg(long)]
    pub min: Option<Decimal>,
    /// Maximum price
    #[arg(long)]
    pub max: Option<Decimal>,
    /// Category id
    #[arg(long)]
    pub category: Option<CategoryId>,
    /// Only products in stock
    #[arg(long)]
    pub in_stock: bool,
    /// `price_asc`, `price_desc`, `name_asc` or `name_desc`
    #[arg(long)]
    pub sort: Option<SortOrder>,
    /// Maximum number of results
    #[arg(long, default_value_t = 200)]
    pub limit: u32,
}

impl From<SearchArgs> for ProductQuery {
    fn from(args: SearchArgs) -> Self {
        Self {
            q: args.q,
            min: args.min,
            max: args.max,
            category_id: args.category,
            in_stock: args.in_stock.then_some(true),
            sort: args.sort,
            limit: Some(args.limit),
        }
    }
}

#[derive(Debug, Args)]
pub struct ReviewArgs {
    /// Product id
    pub id: ProductId,
    /// Your name
    #[arg(short, long)]
    pub name: String,
    /// Rating from 1 to 5
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub rating: u8,
    /// Review text
    pub text: String,
}

/// List the newest products.
///
/// # Errors
///
/// Returns an error if the API request fails.
pub async fn products(state: &AppState, limit: u32) -> Result<(), AppError> {
    let products = state.api().list_products(limit).await?;
    report(&render_products(&products));
    Ok(())
}

/// List product categories.
///
/// # Errors
///
/// Returns an error if the API request fails.
pub async fn categories(state: &AppState) -> Result<(), AppError> {
    let categories = state.api().categories().await?;
    let out = categories
        .iter()
        .map(|c| format!("{:>6}  {}", c.id, c.name))
        .collect::<Vec<_>>()
        .join("\n");
    report(&out);
    Ok(())
}

/// Search products.
///
/// # Errors
///
/// Returns an error if the API request fails.
pub async fn search(state: &AppState, args: SearchArgs) -> Result<(), AppError> {
    let products = state.api().search_products(&args.into()).await?;
    report(&render_products(&products));
    Ok(())
}

/// Show a product's reviews.
///
/// # Errors
///
/// Returns an error if the API request fails.
pub async fn reviews(state: &AppState, id: &ProductId) -> Result<(), AppError> {
    let reviews = state.api().reviews(id).await?;
    report(&render_reviews(&reviews));
    Ok(())
}

/// Post a review.
///
/// # Errors
///
/// Returns an error if the text is blank or the API request fails.
pub async fn review(state: &AppState, args: ReviewArgs) -> Result<(), AppError> {
    if args.text.trim().is_empty() || args.name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "name and review text are required".to_string(),
        ));
    }
    let review = NewReview {
        name: args.name,
        text: args.text,
        rating: args.rating,
    };
    state.api().submit_review(&args.id, &review).await?;
    report("Thanks for your review!");
    Ok(())
}

pub fn render_products(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products found.".to_string();
    }
    let mut out = String::new();
    for (i, product) in products.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(
            out,
            "{:>6}  {:<36} {:>14}",
            product.key(),
            product.name,
            format_price(product.price, product.currency.as_deref())
        );
    }
    out
}

fn render_reviews(reviews: &[Review]) -> String {
    if reviews.is_empty() {
        return "No reviews yet.".to_string();
    }
    reviews
        .iter()
        .map(|r| {
            let stars = "★".repeat(usize::from(r.rating.min(5)));
            let date = r
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            format!("{stars:<5} {} {date}\n      {}", r.name, r.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_args_to_query() {
        let args = SearchArgs {
            q: Some("serum".to_string()),
            min: None,
            max: Some(Decimal::from(100)),
            category: None,
            in_stock: false,
            sort: Some(SortOrder::PriceAsc),
            limit: 50,
        };
        let query = ProductQuery::from(args);
        assert_eq!(query.in_stock, None);
        assert_eq!(
            query.to_pairs(),
            vec![
                ("q", "serum".to_string()),
                ("max", "100".to_string()),
                ("sort", "price_asc".to_string()),
                ("limit", "50".to_string()),
            ]
        );
    }

    #[test]
    fn test_render_no_products() {
        assert_eq!(render_products(&[]), "No products found.");
    }

    #[test]
    fn test_render_reviews() {
        let reviews: Vec<Review> = sample_reviews();
        let out = render_reviews(&reviews);
        assert!(out.starts_with("★★★★"));
        assert!(out.contains("Lovely texture"));
    }

    fn sample_reviews() -> Vec<Review> {
        vec![Review {
            id: None,
            name: "Noor".to_string(),
            text: "Lovely texture".to_string(),
            rating: 4,
            date: None,
        }]
    }
}
