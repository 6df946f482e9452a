//! RocketCart - client-side shopping cart manager.
//!
//! A [`CartManager`] keeps three copies of cart state consistent: the
//! in-memory cart, the remote stock levels, and the durable snapshot.
//!
//! # Architecture
//!
//! - Collaborators are injected: an [`InventorySource`], an [`ItemCatalog`],
//!   a [`KeyValueStore`] and a [`Notifier`]
//! - Operations (`add`, `remove`, `set_quantity`, `clear`) are serialized per
//!   cart instance and hold the cart lock across remote lookups
//! - Every successful mutation is written through to storage before it is
//!   committed in memory or published to observers
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rocketcart::{CartManager, CartStorage, FileStore, HttpApi, TracingNotifier};
//!
//! let api = HttpApi::new(&config.api)?;
//! let storage = CartStorage::new(FileStore::open(&config.store_dir)?);
//! let manager = CartManager::hydrate(api.clone(), api, storage, Arc::new(TracingNotifier));
//!
//! manager.add(ItemId::new(1)).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod inventory;
pub mod manager;
pub mod notify;
pub mod storage;

pub use cache::CachedCatalog;
pub use config::{ApiConfig, CartConfig, ConfigError};
pub use error::CartError;
pub use http::HttpApi;
pub use inventory::{InventorySource, ItemCatalog, LookupError};
pub use manager::{CartChange, CartManager};
pub use notify::{ChannelNotifier, Notification, Notifier, NotifyLevel, TracingNotifier};
pub use storage::{
    CART_STORAGE_KEY, CartStorage, FileStore, KeyValueStore, MemoryStore, Snapshot, StoreError,
};

pub use rocketcart_core::{Cart, ItemAttributes, ItemId, LineItem, Quantity, StockRecord};
