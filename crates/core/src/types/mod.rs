//! Core types for the KOS storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod status;

pub use id::*;
pub use price::{DEFAULT_CURRENCY, format_price};
pub use status::*;
