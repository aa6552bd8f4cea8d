//! The signed-in customer's bearer credential.
//!
//! The token is stored raw (not JSON) under [`AuthSession::STORAGE_KEY`] and
//! kept in a [`SecretString`] in memory so it never shows up in logs.

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::storage::KeyValueStore;

/// Persisted authentication state.
///
/// Cheap to clone; all clones share one credential.
#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    storage: Arc<dyn KeyValueStore>,
    token: RwLock<Option<SecretString>>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    /// Storage key for the bearer token.
    pub const STORAGE_KEY: &'static str = "auth_token";

    /// Load a previously stored token, if any.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let token = match storage.get(Self::STORAGE_KEY) {
            Ok(Some(raw)) if !raw.trim().is_empty() => {
                Some(SecretString::from(raw.trim().to_owned()))
            }
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored session");
                None
            }
        };

        Self {
            inner: Arc::new(SessionInner {
                storage,
                token: RwLock::new(token),
            }),
        }
    }

    /// A copy of the current token.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| SecretString::from(t.expose_secret().to_owned()))
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Replace the current token and persist it.
    pub fn set(&self, token: SecretString) {
        if let Err(e) = self
            .inner
            .storage
            .set(Self::STORAGE_KEY, token.expose_secret())
        {
            warn!(error = %e, "Failed to persist session");
        }
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
        debug!("Session stored");
    }

    /// Forget the token locally.
    pub fn clear(&self) {
        if let Err(e) = self.inner.storage.remove(Self::STORAGE_KEY) {
            warn!(error = %e, "Failed to remove stored session");
        }
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        debug!("Session cleared");
    }
}
