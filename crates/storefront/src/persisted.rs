//! Apply-and-persist wrapper shared by the cart and wishlist stores.
//!
//! The state lives in a `watch` channel: the sender is the single source of
//! truth and every receiver sees the whole state after each change. A
//! transition runs and is written to storage while the channel's write lock is
//! held, so mutations are applied and persisted one at a time in call order.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::storage::KeyValueStore;

#[derive(Debug)]
pub(crate) struct PersistedStore<T> {
    key: &'static str,
    storage: Arc<dyn KeyValueStore>,
    state: watch::Sender<T>,
}

impl<T> PersistedStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Read the stored document, falling back to `T::default()` when it is
    /// missing, unreadable or malformed. `repair` restores invariants a
    /// well-formed but stale document may violate.
    pub(crate) fn load(
        key: &'static str,
        storage: Arc<dyn KeyValueStore>,
        repair: impl FnOnce(T) -> T,
    ) -> Self {
        let initial = match storage.get(key) {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(state) => repair(state),
                Err(e) => {
                    warn!(key, error = %e, "Discarding malformed stored state");
                    T::default()
                }
            },
            Ok(None) => T::default(),
            Err(e) => {
                warn!(key, error = %e, "Failed to read stored state");
                T::default()
            }
        };

        let (state, _) = watch::channel(initial);
        Self {
            key,
            storage,
            state,
        }
    }

    /// Run `f` against the current state.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Replace the state with `transition(state)` and persist the result.
    ///
    /// Storage failures are logged and swallowed; the in-memory state stays
    /// authoritative for the rest of the session.
    pub(crate) fn update(&self, transition: impl FnOnce(T) -> T) {
        self.state.send_modify(|state| {
            let current = std::mem::take(state);
            *state = transition(current);
            self.persist(state);
        });
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<T> {
        self.state.subscribe()
    }

    fn persist(&self, state: &T) {
        let serialized = match serde_json::to_string(state) {
            Ok(s) => s,
            Err(e) => {
                warn!(key = self.key, error = %e, "Failed to serialize state");
                return;
            }
        };

        match self.storage.set(self.key, &serialized) {
            Ok(()) => debug!(key = self.key, "Persisted state"),
            Err(e) => warn!(key = self.key, error = %e, "Failed to persist state"),
        }
    }
}

impl<T: Clone> PersistedStore<T> {
    pub(crate) fn snapshot(&self) -> T {
        self.state.borrow().clone()
    }
}

/// Read a stored list entry by entry, dropping entries that do not parse
/// (an ID that is a float, `null` or missing) instead of failing the whole
/// document.
pub(crate) fn lenient_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    let total = raw.len();
    let entries: Vec<T> = raw
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();
    if entries.len() < total {
        warn!(
            dropped = total - entries.len(),
            "Dropping unreadable stored entries"
        );
    }
    Ok(entries)
}
