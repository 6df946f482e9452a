//! Cart line items and the cart collection.
//!
//! The [`Cart`] type owns the collection invariants: ids are unique and every
//! line holds at least one unit. All mutation goes through its methods so a
//! cart that violates either rule cannot be built, deserialized, or edited
//! into existence.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ItemId;
use super::price::{CurrencyCode, Price};
use super::quantity::Quantity;

/// Static, catalog-owned attributes of an item.
///
/// Fields the cart does not know about are kept in `extra` so that a
/// snapshot written back to storage carries everything the catalog sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAttributes {
    pub title: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ItemAttributes {
    /// Attributes with only a title and a price.
    #[must_use]
    pub fn new(title: impl Into<String>, price: Decimal) -> Self {
        Self {
            title: title.into(),
            price,
            image: None,
            extra: serde_json::Map::new(),
        }
    }

    /// The unit price tagged with a currency, for display.
    #[must_use]
    pub const fn price_in(&self, currency_code: CurrencyCode) -> Price {
        Price::new(self.price, currency_code)
    }
}

/// One entry in the cart.
///
/// Serializes flat as `{ "id", <attributes>..., "amount" }`, the layout
/// persisted carts have always used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ItemId,
    #[serde(flatten)]
    pub attributes: ItemAttributes,
    #[serde(rename = "amount")]
    pub quantity: Quantity,
}

impl LineItem {
    /// Create a line item.
    #[must_use]
    pub const fn new(id: ItemId, attributes: ItemAttributes, quantity: Quantity) -> Self {
        Self {
            id,
            attributes,
            quantity,
        }
    }
}

/// Errors raised when a collection would break the cart invariants.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartInvariantError {
    /// Two line items share an id.
    #[error("duplicate line item for item {0}")]
    DuplicateItem(ItemId),
    /// The operation targets an item that is not in the cart.
    #[error("item {0} is not in the cart")]
    Missing(ItemId),
}

/// Ordered collection of line items, unique by id.
///
/// Insertion order is preserved for display only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct Cart {
    lines: Vec<LineItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a cart from existing lines, checking id uniqueness.
    ///
    /// # Errors
    ///
    /// Returns [`CartInvariantError::DuplicateItem`] if two lines share an id.
    pub fn from_lines(lines: Vec<LineItem>) -> Result<Self, CartInvariantError> {
        for (i, line) in lines.iter().enumerate() {
            if lines.iter().skip(i + 1).any(|other| other.id == line.id) {
                return Err(CartInvariantError::DuplicateItem(line.id));
            }
        }
        Ok(Self { lines })
    }

    /// The line items in display order.
    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    /// The line for `id`, if present.
    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&LineItem> {
        self.lines.iter().find(|line| line.id == id)
    }

    /// Whether `id` has a line in the cart.
    #[must_use]
    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Number of distinct line items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.quantity.get()))
            .sum()
    }

    /// Append a new line.
    ///
    /// # Errors
    ///
    /// Returns [`CartInvariantError::DuplicateItem`] if the id already has a line.
    pub fn insert(&mut self, line: LineItem) -> Result<(), CartInvariantError> {
        if self.contains(line.id) {
            return Err(CartInvariantError::DuplicateItem(line.id));
        }
        self.lines.push(line);
        Ok(())
    }

    /// Replace the quantity of an existing line, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`CartInvariantError::Missing`] if the id has no line.
    pub fn set_quantity(
        &mut self,
        id: ItemId,
        quantity: Quantity,
    ) -> Result<Quantity, CartInvariantError> {
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.id == id)
            .ok_or(CartInvariantError::Missing(id))?;
        Ok(std::mem::replace(&mut line.quantity, quantity))
    }

    /// Remove the line for `id`, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`CartInvariantError::Missing`] if the id has no line.
    pub fn remove(&mut self, id: ItemId) -> Result<LineItem, CartInvariantError> {
        let index = self
            .lines
            .iter()
            .position(|line| line.id == id)
            .ok_or(CartInvariantError::Missing(id))?;
        Ok(self.lines.remove(index))
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl TryFrom<Vec<LineItem>> for Cart {
    type Error = CartInvariantError;

    fn try_from(lines: Vec<LineItem>) -> Result<Self, Self::Error> {
        Self::from_lines(lines)
    }
}

impl From<Cart> for Vec<LineItem> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}
