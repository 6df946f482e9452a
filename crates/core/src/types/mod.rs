//! Core types for RocketCart.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod cart;
pub mod id;
pub mod price;
pub mod quantity;
pub mod stock;

pub use cart::{Cart, CartInvariantError, ItemAttributes, LineItem};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use quantity::{Quantity, QuantityError};
pub use stock::StockRecord;
