//! The shared, persisted wishlist.

use std::sync::Arc;

use kos_core::ProductId;
use tokio::sync::watch;
use tracing::debug;

use super::{WishlistCommand, WishlistItem, WishlistState};
use crate::persisted::PersistedStore;
use crate::storage::KeyValueStore;

/// Handle to the wishlist. Cheap to clone; all clones share one state.
#[derive(Debug, Clone)]
pub struct WishlistStore {
    inner: Arc<PersistedStore<WishlistState>>,
}

impl WishlistStore {
    /// Storage key for the wishlist document.
    pub const STORAGE_KEY: &'static str = "kos_wishlist_v1";

    /// Load the wishlist from storage, starting empty if nothing usable is
    /// stored.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let inner = PersistedStore::load(Self::STORAGE_KEY, storage, WishlistState::repaired);
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Apply a command and persist the result.
    pub fn dispatch(&self, command: WishlistCommand) {
        debug!(?command, "Wishlist command");
        self.inner.update(|state| state.apply(command));
    }

    #[must_use]
    pub fn is_in_wishlist(&self, id: &ProductId) -> bool {
        self.inner.read(|state| state.contains(id))
    }

    pub fn add(&self, item: WishlistItem) {
        self.dispatch(WishlistCommand::Add(item));
    }

    pub fn remove(&self, id: &ProductId) {
        self.dispatch(WishlistCommand::Remove(id.clone()));
    }

    /// Remove the product if saved, otherwise save it. Returns whether the
    /// product is saved afterwards.
    pub fn toggle(&self, item: WishlistItem) -> bool {
        let id = item.id.clone();
        let command = WishlistCommand::Toggle(item);
        debug!(?command, "Wishlist command");
        let mut saved = false;
        self.inner.update(|state| {
            let next = state.apply(command);
            saved = next.contains(&id);
            next
        });
        saved
    }

    pub fn clear(&self) {
        self.dispatch(WishlistCommand::Clear);
    }

    #[must_use]
    pub fn items(&self) -> Vec<WishlistItem> {
        self.inner.read(|state| state.items().to_vec())
    }

    #[must_use]
    pub fn snapshot(&self) -> WishlistState {
        self.inner.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WishlistState> {
        self.inner.subscribe()
    }
}
