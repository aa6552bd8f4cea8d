//! Application state shared across commands.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::cart::CartStore;
use crate::config::StorefrontConfig;
use crate::session::AuthSession;
use crate::storage::{FileStore, KeyValueStore};
use crate::wishlist::WishlistStore;

/// Application state shared by everything that touches the storefront.
///
/// This struct is cheaply cloneable via `Arc`. Each store is loaded exactly
/// once here; callers receive handles to the same instances.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storage: Arc<dyn KeyValueStore>,
    api: ApiClient,
    cart: CartStore,
    wishlist: WishlistStore,
    session: AuthSession,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("api", &self.inner.api)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create application state backed by files under `config.storage_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.storage_dir.clone()));
        Self::with_storage(config, storage)
    }

    /// Create application state over an existing store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_storage(
        config: StorefrontConfig,
        storage: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config)?;
        let cart = CartStore::load(Arc::clone(&storage));
        let wishlist = WishlistStore::load(Arc::clone(&storage));
        let session = AuthSession::load(Arc::clone(&storage));

        tracing::debug!(
            cart_lines = cart.items().len(),
            wishlist_items = wishlist.items().len(),
            authenticated = session.is_authenticated(),
            "Storefront state loaded"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                storage,
                api,
                cart,
                wishlist,
                session,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backing store.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.inner.storage
    }

    /// Get a reference to the storefront API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &WishlistStore {
        &self.inner.wishlist
    }

    #[must_use]
    pub fn session(&self) -> &AuthSession {
        &self.inner.session
    }
}
