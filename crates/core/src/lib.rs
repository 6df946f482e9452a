//! RocketCart Core - Shared cart types library.
//!
//! This crate provides the types used across all RocketCart components:
//! - `rocketcart` - Cart manager and its collaborators
//! - `cli` - Command-line front end for inspecting and editing a cart
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. Everything here can be constructed and checked in
//! isolation, which keeps the cart invariants testable without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, quantities, prices, line items and the cart collection

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

pub use rust_decimal::Decimal;
