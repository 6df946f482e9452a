//! Cart operation errors.
//!
//! Every failed operation returns exactly one [`CartError`]. Each variant maps
//! to its own user-facing message and notification level, so "cannot sell"
//! and "system error" never collapse into one catch-all toast.

use rocketcart_core::{CartInvariantError, ItemId};
use thiserror::Error;

use crate::inventory::LookupError;
use crate::notify::NotifyLevel;
use crate::storage::StoreError;

/// Reasons a cart operation was rejected or could not complete.
#[derive(Debug, Error)]
pub enum CartError {
    /// The item id cannot refer to a real item.
    #[error("Invalid item id: {0}")]
    InvalidItem(ItemId),

    /// The item or its stock record does not exist.
    #[error("Item not found: {0}")]
    NotFound(ItemId),

    /// More units were requested than are available.
    #[error("Out of stock for item {id}: requested {requested}, available {available}")]
    OutOfStock {
        id: ItemId,
        requested: u32,
        available: u32,
    },

    /// Removal of an item that has no line in the cart.
    #[error("Item {0} is not in the cart")]
    AlreadyAbsent(ItemId),

    /// Quantity change for an item that has no line in the cart.
    #[error("Item {0} must be in the cart before its quantity can change")]
    NotInCart(ItemId),

    /// A remote lookup failed or timed out.
    #[error("Lookup failed for item {id}: {reason}")]
    Transient { id: ItemId, reason: String },

    /// The new cart could not be written to durable storage.
    #[error("Failed to persist cart: {0}")]
    Persist(#[from] StoreError),

    /// A cart edit broke the collection invariants.
    #[error("Cart invariant violated: {0}")]
    Invariant(#[from] CartInvariantError),
}

impl CartError {
    /// Translate a failed remote lookup for `id`.
    #[must_use]
    pub fn from_lookup(id: ItemId, err: LookupError) -> Self {
        match err {
            LookupError::NotFound => Self::NotFound(id),
            LookupError::Transient(reason) => Self::Transient { id, reason },
        }
    }

    /// Severity used when notifying the user.
    ///
    /// A change that was accepted but could not be saved outranks every
    /// validation failure.
    #[must_use]
    pub const fn notify_level(&self) -> NotifyLevel {
        match self {
            Self::Persist(_) | Self::Invariant(_) => NotifyLevel::Critical,
            _ => NotifyLevel::Error,
        }
    }

    /// Whether the failure came from the cart's own state or stock rules
    /// rather than from infrastructure.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidItem(_)
                | Self::NotFound(_)
                | Self::OutOfStock { .. }
                | Self::AlreadyAbsent(_)
                | Self::NotInCart(_)
        )
    }

    /// Message shown to the shopper. Internal details are not exposed.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidItem(_) => "Invalid item",
            Self::NotFound(_) => "This item does not exist",
            Self::OutOfStock { .. } => "Requested quantity exceeds available stock",
            Self::AlreadyAbsent(_) => "This item is not in your cart",
            Self::NotInCart(_) => "Add this item to your cart before changing its quantity",
            Self::Transient { .. } => "Could not reach the store, please try again",
            Self::Persist(_) => "Your cart change could not be saved",
            Self::Invariant(_) => "Your cart is in an unexpected state",
        }
    }
}
