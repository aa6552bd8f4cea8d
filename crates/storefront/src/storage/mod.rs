//! Durable client storage.
//!
//! A small key-value interface standing in for browser local storage. Stores
//! own their key and write the whole serialized document on every change, so
//! implementations only need whole-value get/set/remove.
//!
//! - [`FileStore`] - one JSON document per key under a directory
//! - [`MemoryStore`] - process-local map, optionally with a size quota

mod file;
mod memory;

use std::path::PathBuf;

use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors that can occur when reading or writing storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Key contains characters that are not allowed in a storage key.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the value would exceed the store's quota.
    #[error("Storage quota exceeded: {needed} bytes needed, {limit} allowed")]
    QuotaExceeded { needed: usize, limit: usize },

    /// A previous holder of the store's lock panicked.
    #[error("Storage lock poisoned")]
    Poisoned,
}

/// A durable key-value store.
///
/// All methods take `&self`; implementations use interior mutability so a
/// single store can be shared behind an `Arc`.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Read a value. Returns `Ok(None)` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the key is invalid or the read fails.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or replace a value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the key is invalid or the write fails.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the key is invalid or the removal fails.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Check that a key is non-empty and limited to `[A-Za-z0-9_-]`.
///
/// The same rule applies to every backend so data can move between them.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_owned()))
    }
}
