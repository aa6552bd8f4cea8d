//! KOS Storefront library.
//!
//! Client-side state and API access for the KOS beauty storefront:
//!
//! - [`storage`] - durable key-value storage (file-backed or in-memory)
//! - [`cart`] / [`wishlist`] - reducer-style stores persisted after every change
//! - [`session`] - the persisted bearer credential
//! - [`api`] - REST client for the storefront backend
//! - [`checkout`] - cash-on-delivery order placement
//!
//! [`state::AppState`] wires these together once at start-up; everything that
//! needs a store receives a handle to it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod session;
pub mod state;
pub mod storage;
pub mod wishlist;

mod persisted;
