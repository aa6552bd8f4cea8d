//! KOS Core - Shared types library.
//!
//! This crate provides common types used across all KOS storefront components:
//! - `storefront` - Cart and wishlist stores, durable storage, API client
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Identifier wrappers, lenient price handling, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
