//! Shopping cart state.
//!
//! [`CartState`] is a plain value: [`CartState::apply`] takes a
//! [`CartCommand`] and returns the next state without touching storage. The
//! shared, persisted handle lives in [`CartStore`].
//!
//! # Invariants
//!
//! - Line items are unique by [`ProductId`] (strict equality).
//! - Every line item has `qty >= 1`; a line reaching zero is removed.

mod store;

use std::collections::HashSet;

use kos_core::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

pub use store::CartStore;

/// One product in the cart and how many of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    /// Unit price.
    #[serde(default, with = "kos_core::price::lenient")]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Image URL or `data:` URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    #[serde(default, deserialize_with = "lenient_qty")]
    pub qty: u32,
}

impl CartLineItem {
    /// `price * qty`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price
            .checked_mul(Decimal::from(self.qty))
            .unwrap_or(Decimal::MAX)
    }
}

/// A product as handed to [`CartCommand::AddItem`]: a line item without a
/// quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub currency: Option<String>,
    pub img: Option<String>,
}

impl NewCartItem {
    /// An item with only the required fields set.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            currency: None,
            img: None,
        }
    }

    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    #[must_use]
    pub fn with_img(mut self, img: impl Into<String>) -> Self {
        self.img = Some(img.into());
        self
    }

    fn into_line(self, qty: u32) -> CartLineItem {
        CartLineItem {
            id: self.id,
            name: self.name,
            price: self.price.max(Decimal::ZERO),
            currency: self.currency,
            img: self.img,
            qty,
        }
    }
}

/// A cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartCommand {
    /// Add `qty` of `item`, merging into an existing line with the same ID.
    ///
    /// An absent, zero or negative `qty` adds one.
    AddItem { item: NewCartItem, qty: Option<i64> },
    /// Drop the line with this ID, if any.
    RemoveItem { id: ProductId },
    /// Set the line's quantity; zero or below removes it.
    SetQty { id: ProductId, qty: i64 },
    /// Remove every line.
    Clear,
}

/// The cart contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    #[serde(default, deserialize_with = "crate::persisted::lenient_entries")]
    items: Vec<CartLineItem>,
}

impl CartState {
    /// Build a state from arbitrary line items, enforcing the invariants:
    /// lines with `qty == 0` are dropped and the first line for each ID wins.
    #[must_use]
    pub fn from_items(items: Vec<CartLineItem>) -> Self {
        Self { items }.repaired()
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a line by ID.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|line| &line.id == id)
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.qty)).sum()
    }

    /// Sum of `price * qty` across all lines, saturating at `Decimal::MAX`.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items
            .iter()
            .map(CartLineItem::line_total)
            .try_fold(Decimal::ZERO, Decimal::checked_add)
            .unwrap_or(Decimal::MAX)
    }

    /// Apply a command and return the resulting state.
    #[must_use]
    pub fn apply(mut self, command: CartCommand) -> Self {
        match command {
            CartCommand::AddItem { item, qty } => {
                let increment = added_quantity(qty);
                if let Some(line) = self.items.iter_mut().find(|line| line.id == item.id) {
                    line.qty = line.qty.saturating_add(increment);
                } else {
                    self.items.push(item.into_line(increment));
                }
            }
            CartCommand::RemoveItem { id } => self.items.retain(|line| line.id != id),
            CartCommand::SetQty { id, qty } => {
                if qty <= 0 {
                    self.items.retain(|line| line.id != id);
                } else {
                    let qty = u32::try_from(qty).unwrap_or(u32::MAX);
                    for line in self.items.iter_mut().filter(|line| line.id == id) {
                        line.qty = qty;
                    }
                }
            }
            CartCommand::Clear => self.items.clear(),
        }
        self
    }

    pub(crate) fn repaired(mut self) -> Self {
        let mut seen = HashSet::new();
        self.items
            .retain(|line| line.qty > 0 && seen.insert(line.id.clone()));
        self
    }
}

fn added_quantity(qty: Option<i64>) -> u32 {
    qty.filter(|q| *q > 0)
        .map_or(1, |q| u32::try_from(q).unwrap_or(u32::MAX))
}

/// Quantities from storage: anything that is not a positive integer reads as
/// zero and the line is dropped on load.
fn lenient_qty<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_i64()
        .map_or(0, |q| u32::try_from(q.max(0)).unwrap_or(u32::MAX)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn serum() -> NewCartItem {
        NewCartItem::new(1, "Serum", Decimal::from(30))
    }

    fn add(state: CartState, item: NewCartItem, qty: Option<i64>) -> CartState {
        state.apply(CartCommand::AddItem { item, qty })
    }

    #[test]
    fn test_add_new_item_defaults_to_one() {
        let state = add(CartState::default(), serum(), None);

        assert_eq!(state.items().len(), 1);
        assert_eq!(state.items()[0].qty, 1);
        assert_eq!(state.items()[0].name, "Serum");
    }

    #[test]
    fn test_add_same_item_accumulates() {
        let state = add(CartState::default(), serum(), Some(1));
        let state = add(state, serum(), Some(1));

        assert_eq!(state.items().len(), 1);
        assert_eq!(state.items()[0].qty, 2);
    }

    #[test]
    fn test_add_existing_keeps_original_fields() {
        let state = add(CartState::default(), serum(), None);
        let renamed = NewCartItem::new(1, "Serum (new label)", Decimal::from(99));
        let state = add(state, renamed, Some(2));

        let line = state.get(&ProductId::from(1)).unwrap();
        assert_eq!(line.name, "Serum");
        assert_eq!(line.price, Decimal::from(30));
        assert_eq!(line.qty, 3);
    }

    #[test]
    fn test_add_non_positive_qty_adds_one() {
        let state = add(CartState::default(), serum(), Some(0));
        assert_eq!(state.items()[0].qty, 1);

        let state = add(state, serum(), Some(0));
        assert_eq!(state.items()[0].qty, 2);

        let state = add(state, serum(), Some(-4));
        assert_eq!(state.items()[0].qty, 3);
    }

    #[test]
    fn test_numeric_and_string_ids_are_distinct_lines() {
        let state = add(CartState::default(), serum(), None);
        let state = add(state, NewCartItem::new("1", "Serum", Decimal::from(30)), None);
        assert_eq!(state.items().len(), 2);
    }

    #[test]
    fn test_set_qty_updates_only_matching_line() {
        let state = add(CartState::default(), serum(), None);
        let state = add(state, NewCartItem::new(2, "Toner", Decimal::from(18)), Some(2));

        let state = state.apply(CartCommand::SetQty {
            id: ProductId::from(1),
            qty: 5,
        });

        assert_eq!(state.get(&ProductId::from(1)).unwrap().qty, 5);
        assert_eq!(state.get(&ProductId::from(2)).unwrap().qty, 2);
    }

    #[test]
    fn test_set_qty_zero_or_negative_removes() {
        for qty in [0, -1, i64::MIN] {
            let state = add(CartState::default(), serum(), Some(3));
            let state = state.apply(CartCommand::SetQty {
                id: ProductId::from(1),
                qty,
            });
            assert!(state.is_empty(), "qty {qty} should remove the line");
        }
    }

    #[test]
    fn test_set_qty_on_missing_id_is_noop() {
        let state = add(CartState::default(), serum(), None);
        let next = state.clone().apply(CartCommand::SetQty {
            id: ProductId::from(404),
            qty: 7,
        });
        assert_eq!(next, state);
    }

    #[test]
    fn test_remove_missing_id_is_noop() {
        let state = add(CartState::default(), serum(), Some(2));
        let next = state.clone().apply(CartCommand::RemoveItem {
            id: ProductId::from(404),
        });
        assert_eq!(next, state);
    }

    #[test]
    fn test_clear() {
        let state = add(CartState::default(), serum(), Some(2));
        assert!(state.apply(CartCommand::Clear).is_empty());
    }

    #[test]
    fn test_totals() {
        let state = add(CartState::default(), serum(), Some(2));
        let state = add(
            state,
            NewCartItem::new(2, "Lip Oil", Decimal::new(1250, 2)),
            Some(3),
        );

        assert_eq!(state.total_quantity(), 5);
        assert_eq!(state.total_price(), Decimal::new(9750, 2));
    }

    #[test]
    fn test_total_price_saturates_instead_of_overflowing() {
        let raw = r#"{"items":[
            {"id":1,"price":"50000000000000000000000000000","qty":1},
            {"id":2,"price":"50000000000000000000000000000","qty":1}
        ]}"#;

        let state = serde_json::from_str::<CartState>(raw).unwrap().repaired();

        assert_eq!(state.items().len(), 2);
        assert_eq!(state.total_price(), Decimal::MAX);
    }

    #[test]
    fn test_walkthrough() {
        let state = CartState::default();

        let state = add(state, serum(), None);
        assert_eq!(state.items()[0].qty, 1);

        let state = add(state, serum(), None);
        assert_eq!(state.items()[0].qty, 2);
        assert_eq!(state.total_price(), Decimal::from(60));
        assert_eq!(state.total_quantity(), 2);

        let state = state.apply(CartCommand::SetQty {
            id: ProductId::from(1),
            qty: 0,
        });
        assert!(state.is_empty());

        let state = add(state, NewCartItem::new(2, "", Decimal::from(18)), Some(3));
        let state = state.apply(CartCommand::RemoveItem {
            id: ProductId::from(2),
        });
        assert!(state.is_empty());
    }

    #[test]
    fn test_invariants_hold_over_mixed_sequence() {
        let ids = [1_i64, 2, 3, 1, 2, 1];
        let qtys = [3_i64, 0, -2, 5, 1, -1];
        let mut state = CartState::default();

        for (step, (&id, &qty)) in ids.iter().zip(qtys.iter()).enumerate() {
            let command = if step % 2 == 0 {
                CartCommand::AddItem {
                    item: NewCartItem::new(id, "x", Decimal::ONE),
                    qty: Some(qty),
                }
            } else {
                CartCommand::SetQty {
                    id: ProductId::from(id),
                    qty,
                }
            };
            state = state.apply(command);

            let mut seen = HashSet::new();
            for line in state.items() {
                assert!(line.qty >= 1);
                assert!(seen.insert(line.id.clone()), "duplicate id {}", line.id);
            }
        }
    }

    #[test]
    fn test_serialized_shape() {
        let state = add(
            CartState::default(),
            serum().with_currency("QAR").with_img("/img/serum.png"),
            Some(2),
        );

        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "items": [{
                    "id": 1,
                    "name": "Serum",
                    "price": 30,
                    "currency": "QAR",
                    "img": "/img/serum.png",
                    "qty": 2
                }]
            })
        );
    }

    #[test]
    fn test_deserialize_tolerates_sloppy_documents() {
        let raw = r#"{"items":[
            {"id":"a","name":"A","price":"12.5","qty":1},
            {"id":"b","name":"B","qty":2},
            {"id":"c","name":"C","price":5,"qty":0},
            {"id":"a","name":"A again","price":1,"qty":4}
        ]}"#;

        let state = serde_json::from_str::<CartState>(raw).unwrap().repaired();

        assert_eq!(state.items().len(), 2);
        assert_eq!(state.items()[0].price, Decimal::new(125, 1));
        assert_eq!(state.items()[1].price, Decimal::ZERO);
        assert_eq!(state.total_quantity(), 3);
    }

    #[test]
    fn test_unreadable_ids_drop_only_their_line() {
        let raw = r#"{"items":[
            {"id":2.5,"name":"Float","price":1,"qty":1},
            {"id":null,"name":"Null","price":1,"qty":1},
            {"name":"Missing","price":1,"qty":1},
            {"id":99999999999999999999,"name":"Huge","price":1,"qty":1},
            {"id":4,"name":"Toner","price":18,"qty":2}
        ]}"#;

        let state = serde_json::from_str::<CartState>(raw).unwrap().repaired();

        assert_eq!(state.items().len(), 1);
        assert_eq!(state.items()[0].id, ProductId::from(4));
        assert_eq!(state.total_quantity(), 2);
    }

    #[test]
    fn test_from_items_repairs() {
        let line = serum().into_line(0);
        assert!(CartState::from_items(vec![line]).is_empty());
    }
}
