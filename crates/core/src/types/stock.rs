//! Stock levels reported by the inventory source.

use serde::{Deserialize, Serialize};

use super::id::ItemId;
use super::quantity::Quantity;

/// Units of an item available to sell.
///
/// Owned by the inventory source; the cart only reads it. The wire name of
/// `available` is `amount`, matching the stock endpoint's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: ItemId,
    #[serde(rename = "amount")]
    pub available: u32,
}

impl StockRecord {
    /// Create a stock record.
    #[must_use]
    pub const fn new(id: ItemId, available: u32) -> Self {
        Self { id, available }
    }

    /// Whether `quantity` units can be sold.
    #[must_use]
    pub const fn covers(&self, quantity: Quantity) -> bool {
        quantity.get() <= self.available
    }
}
