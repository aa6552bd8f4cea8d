//! The shared, persisted cart.

use std::sync::Arc;

use kos_core::ProductId;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::debug;

use super::{CartCommand, CartLineItem, CartState, NewCartItem};
use crate::persisted::PersistedStore;
use crate::storage::KeyValueStore;

/// Handle to the cart.
///
/// Cheap to clone; all clones share one state. Every mutation is written to
/// storage before the call returns, and subscribers receive the full state
/// after each one.
#[derive(Debug, Clone)]
pub struct CartStore {
    inner: Arc<PersistedStore<CartState>>,
}

impl CartStore {
    /// Storage key for the cart document.
    pub const STORAGE_KEY: &'static str = "kos_cart_v1";

    /// Load the cart from storage, starting empty if nothing usable is stored.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let inner = PersistedStore::load(Self::STORAGE_KEY, storage, CartState::repaired);
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Apply a command and persist the result.
    pub fn dispatch(&self, command: CartCommand) {
        debug!(?command, "Cart command");
        self.inner.update(|state| state.apply(command));
    }

    /// Add `qty` of `item` (one if `None`).
    pub fn add_item(&self, item: NewCartItem, qty: Option<i64>) {
        self.dispatch(CartCommand::AddItem { item, qty });
    }

    pub fn remove_item(&self, id: &ProductId) {
        self.dispatch(CartCommand::RemoveItem { id: id.clone() });
    }

    /// Set a line's quantity; zero or below removes the line.
    pub fn set_qty(&self, id: &ProductId, qty: i64) {
        self.dispatch(CartCommand::SetQty {
            id: id.clone(),
            qty,
        });
    }

    pub fn clear(&self) {
        self.dispatch(CartCommand::Clear);
    }

    /// Current line items.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        self.inner.read(|state| state.items().to_vec())
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.inner.snapshot()
    }

    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.inner.read(CartState::total_quantity)
    }

    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.inner.read(CartState::total_price)
    }

    /// Observe the cart. The receiver always holds the latest full state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.inner.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn serum() -> NewCartItem {
        NewCartItem::new(1, "Serum", Decimal::from(30)).with_currency("QAR")
    }

    #[test]
    fn test_load_empty_storage() {
        let cart = CartStore::load(Arc::new(MemoryStore::new()));
        assert!(cart.items().is_empty());
        assert_eq!(cart.total_quantity(), 0);
        assert_eq!(cart.total_price(), Decimal::ZERO);
    }

    #[test]
    fn test_load_malformed_document_starts_empty() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(CartStore::STORAGE_KEY, "{not json").unwrap();

        let cart = CartStore::load(storage);

        assert!(cart.items().is_empty());
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let storage = Arc::new(MemoryStore::new());
        let cart = CartStore::load(storage.clone());

        cart.add_item(serum(), Some(2));
        let stored: CartState =
            serde_json::from_str(&storage.get(CartStore::STORAGE_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored, cart.snapshot());

        cart.set_qty(&ProductId::from(1), 0);
        let stored: CartState =
            serde_json::from_str(&storage.get(CartStore::STORAGE_KEY).unwrap().unwrap()).unwrap();
        assert!(stored.is_empty());
    }

    #[test]
    fn test_reload_round_trip_preserves_order() {
        let storage = Arc::new(MemoryStore::new());
        let cart = CartStore::load(storage.clone());
        cart.add_item(NewCartItem::new(3, "Mask", Decimal::from(12)), None);
        cart.add_item(serum(), Some(2));
        cart.add_item(NewCartItem::new("gift-box", "Gift box", Decimal::ZERO), None);

        let reloaded = CartStore::load(storage);

        assert_eq!(reloaded.items(), cart.items());
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let storage = Arc::new(MemoryStore::with_quota(8));
        let cart = CartStore::load(storage.clone());

        cart.add_item(serum(), Some(2));

        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.total_price(), Decimal::from(60));
        assert_eq!(storage.get(CartStore::STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_clones_share_state() {
        let cart = CartStore::load(Arc::new(MemoryStore::new()));
        let other = cart.clone();

        other.add_item(serum(), None);

        assert_eq!(cart.total_quantity(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_full_state_after_each_mutation() {
        let cart = CartStore::load(Arc::new(MemoryStore::new()));
        let mut rx = cart.subscribe();

        cart.add_item(serum(), None);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().total_quantity(), 1);

        cart.add_item(serum(), None);
        rx.changed().await.unwrap();
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.total_quantity(), 2);
        assert_eq!(state.total_price(), Decimal::from(60));

        cart.clear();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_empty());
    }
}
