//! Remote collaborators: stock levels and item attributes.
//!
//! Both traits return `Send` futures so a manager can be driven from any
//! tokio task. Implementations may use `async fn` directly.

use std::future::Future;
use std::sync::Arc;

use rocketcart_core::{ItemAttributes, ItemId, StockRecord};
use thiserror::Error;

/// Why a remote lookup produced no answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The item (or its stock record) does not exist.
    #[error("not found")]
    NotFound,

    /// Network failure, timeout, bad status or malformed payload.
    #[error("transient failure: {0}")]
    Transient(String),
}

/// Authority for how many units of an item can be sold.
pub trait InventorySource: Send + Sync {
    /// Current stock for `id`.
    fn get_stock(
        &self,
        id: ItemId,
    ) -> impl Future<Output = Result<StockRecord, LookupError>> + Send;
}

/// Source of an item's static display attributes.
pub trait ItemCatalog: Send + Sync {
    /// Attributes for `id`.
    fn get_item(
        &self,
        id: ItemId,
    ) -> impl Future<Output = Result<ItemAttributes, LookupError>> + Send;
}

impl<T: InventorySource> InventorySource for Arc<T> {
    fn get_stock(
        &self,
        id: ItemId,
    ) -> impl Future<Output = Result<StockRecord, LookupError>> + Send {
        (**self).get_stock(id)
    }
}

impl<T: ItemCatalog> ItemCatalog for Arc<T> {
    fn get_item(
        &self,
        id: ItemId,
    ) -> impl Future<Output = Result<ItemAttributes, LookupError>> + Send {
        (**self).get_item(id)
    }
}
