//! Saved-for-later products.
//!
//! Unlike the cart, the wishlist matches IDs loosely: a product saved as `12`
//! is the same entry as one looked up with `"12"`.

mod store;

use kos_core::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use store::WishlistStore;

/// A saved product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "kos_core::price::lenient")]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
}

impl WishlistItem {
    /// A saved product. Negative prices are stored as zero.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price: price.max(Decimal::ZERO),
            img: None,
        }
    }

    #[must_use]
    pub fn with_img(mut self, img: impl Into<String>) -> Self {
        self.img = Some(img.into());
        self
    }
}

/// A wishlist mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WishlistCommand {
    /// Insert unless an entry with the same ID exists.
    Add(WishlistItem),
    /// Remove the entry with this ID, if any.
    Remove(ProductId),
    /// Remove if present, otherwise insert.
    Toggle(WishlistItem),
    Clear,
}

/// The wishlist contents, in the order products were saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistState {
    #[serde(default, deserialize_with = "crate::persisted::lenient_entries")]
    items: Vec<WishlistItem>,
}

impl WishlistState {
    #[must_use]
    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether a product with this ID (compared loosely) is saved.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.items.iter().any(|item| item.id.same_as(id))
    }

    /// Apply a command and return the resulting state.
    #[must_use]
    pub fn apply(mut self, command: WishlistCommand) -> Self {
        match command {
            WishlistCommand::Add(item) => {
                if !self.contains(&item.id) {
                    self.items.push(item);
                }
            }
            WishlistCommand::Remove(id) => self.items.retain(|item| !item.id.same_as(&id)),
            WishlistCommand::Toggle(item) => {
                if self.contains(&item.id) {
                    self.items.retain(|saved| !saved.id.same_as(&item.id));
                } else {
                    self.items.push(item);
                }
            }
            WishlistCommand::Clear => self.items.clear(),
        }
        self
    }

    pub(crate) fn repaired(mut self) -> Self {
        let mut kept: Vec<WishlistItem> = Vec::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            if !kept.iter().any(|k| k.id.same_as(&item.id)) {
                kept.push(item);
            }
        }
        self.items = kept;
        self
    }
}
