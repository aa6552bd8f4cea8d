//! Unified error handling.
//!
//! Provides a unified `AppError` type for front-ends built on this crate.
//! Store mutations never fail (storage problems are logged and swallowed), so
//! these errors come from configuration, the API, and checkout.

use thiserror::Error;

use crate::api::ApiError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Storefront API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Order could not be placed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Process exit code for a command that failed with this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 78,
            Self::Storage(_) => 74,
            Self::Api(ApiError::NotAuthenticated)
            | Self::Checkout(CheckoutError::Api(ApiError::NotAuthenticated)) => 77,
            Self::Api(_) | Self::Checkout(CheckoutError::Api(_)) => 69,
            Self::NotFound(_)
            | Self::BadRequest(_)
            | Self::Checkout(CheckoutError::EmptyCart | CheckoutError::MissingField(_)) => 65,
        }
    }

    /// Message suitable for showing to the customer.
    ///
    /// Backend rejections pass through verbatim; transport and parse
    /// failures are summarised so raw internals stay in the logs.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) | Self::Checkout(CheckoutError::Api(err)) => match err {
                ApiError::Api { message, .. } => message.clone(),
                ApiError::NotAuthenticated => "Please log in first.".to_string(),
                ApiError::Http(_) | ApiError::Parse(_) | ApiError::Url(_) => {
                    "The store is unreachable right now. Please try again.".to_string()
                }
            },
            Self::Checkout(err) => err.to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
