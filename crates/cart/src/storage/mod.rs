//! Durable cart storage.
//!
//! Storage is a plain key-value contract ([`KeyValueStore`]). The cart is
//! kept under a single fixed key as a JSON array of line items; see
//! [`CartStorage`]. The store is a write-through sink: the manager never
//! reads it back after a save.

mod file;
mod memory;

use std::sync::Arc;

use rocketcart_core::Cart;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Key the serialized cart is stored under.
pub const CART_STORAGE_KEY: &str = "@RocketShoes:cart";

/// Errors raised by a key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The cart could not be encoded.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The store refused or could not service the request.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous string key-value storage that survives restarts.
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, or `None` if nothing was stored.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the value was not durably written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

/// Result of reading the stored cart.
#[derive(Debug)]
pub enum Snapshot {
    /// No cart has been saved yet.
    Absent,
    /// A valid cart.
    Loaded(Cart),
    /// Something is stored but it is not a valid cart.
    Corrupt(serde_json::Error),
}

/// Reads and writes the cart snapshot through a [`KeyValueStore`].
pub struct CartStorage {
    store: Box<dyn KeyValueStore>,
}

impl std::fmt::Debug for CartStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStorage")
            .field("key", &CART_STORAGE_KEY)
            .finish_non_exhaustive()
    }
}

impl CartStorage {
    /// Wrap a key-value store.
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Read the stored cart.
    ///
    /// Parsing failures (including duplicate ids or zero quantities) come
    /// back as [`Snapshot::Corrupt`], not as an error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` only if the store itself cannot be read.
    pub fn load(&self) -> Result<Snapshot, StoreError> {
        let Some(raw) = self.store.get(CART_STORAGE_KEY)? else {
            return Ok(Snapshot::Absent);
        };

        Ok(match serde_json::from_str::<Cart>(&raw) {
            Ok(cart) => Snapshot::Loaded(cart),
            Err(e) => Snapshot::Corrupt(e),
        })
    }

    /// Replace the stored cart with `cart`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the cart cannot be encoded or written.
    pub fn save(&self, cart: &Cart) -> Result<(), StoreError> {
        let json = serde_json::to_string(cart)?;
        self.store.set(CART_STORAGE_KEY, &json)
    }
}
