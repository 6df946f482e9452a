//! Integration test fixtures for RocketCart.
//!
//! Provides in-process stand-ins for the cart's collaborators so the public
//! `CartManager` API can be exercised end to end without a network:
//!
//! - [`StubInventory`] - stock levels that tests can change mid-run, with an
//!   optional delay or a lookup that never resolves
//! - [`StubCatalog`] - item attributes keyed by id, with optional failures
//! - [`RecordingNotifier`] - captures every notification
//! - [`FlakyStore`] - an in-memory store whose writes can be made to fail
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketcart-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rocketcart::{
    CART_STORAGE_KEY, CartManager, CartStorage, InventorySource, ItemCatalog, KeyValueStore,
    LookupError, MemoryStore, Notifier, NotifyLevel, StoreError,
};
use rocketcart_core::{Cart, Decimal, ItemAttributes, ItemId, StockRecord};

/// Behaviour of every stock lookup.
#[derive(Debug, Clone, Copy, Default)]
pub enum StockMode {
    #[default]
    Immediate,
    Delayed(Duration),
    Hang,
    Fail,
}

/// Inventory source backed by a mutable map.
#[derive(Debug, Default)]
pub struct StubInventory {
    stock: Mutex<HashMap<ItemId, u32>>,
    mode: Mutex<StockMode>,
    calls: AtomicUsize,
}

impl StubInventory {
    /// Inventory holding `(id, available)` pairs.
    #[must_use]
    pub fn with(items: &[(i32, u32)]) -> Arc<Self> {
        let inventory = Self::default();
        for &(id, available) in items {
            inventory.set_stock(id, available);
        }
        Arc::new(inventory)
    }

    /// Change the stock of one item.
    pub fn set_stock(&self, id: i32, available: u32) {
        self.stock
            .lock()
            .unwrap()
            .insert(ItemId::new(id), available);
    }

    /// Change how lookups behave.
    pub fn set_mode(&self, mode: StockMode) {
        *self.mode.lock().unwrap() = mode;
    }

    /// Number of stock lookups made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl InventorySource for StubInventory {
    async fn get_stock(&self, id: ItemId) -> Result<StockRecord, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mode = *self.mode.lock().unwrap();
        match mode {
            StockMode::Immediate => {}
            StockMode::Delayed(delay) => tokio::time::sleep(delay).await,
            StockMode::Hang => std::future::pending::<()>().await,
            StockMode::Fail => return Err(LookupError::Transient("connection reset".to_string())),
        }

        let available = self.stock.lock().unwrap().get(&id).copied();
        available
            .map(|available| StockRecord::new(id, available))
            .ok_or(LookupError::NotFound)
    }
}

/// Behaviour of every catalog lookup.
#[derive(Debug, Clone, Copy, Default)]
pub enum CatalogMode {
    #[default]
    Immediate,
    NotFound,
    Fail,
}

/// Catalog that names item `n` "Item n", unless given explicit titles.
#[derive(Debug, Default)]
pub struct StubCatalog {
    titles: HashMap<ItemId, String>,
    mode: Mutex<CatalogMode>,
    calls: AtomicUsize,
}

impl StubCatalog {
    /// Catalog with explicit titles for some items.
    #[must_use]
    pub fn with_titles(titles: &[(i32, &str)]) -> Self {
        Self {
            titles: titles
                .iter()
                .map(|&(id, title)| (ItemId::new(id), title.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    /// Change how lookups behave.
    pub fn set_mode(&self, mode: CatalogMode) {
        *self.mode.lock().unwrap() = mode;
    }

    /// Number of catalog lookups made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ItemCatalog for StubCatalog {
    async fn get_item(&self, id: ItemId) -> Result<ItemAttributes, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mode = *self.mode.lock().unwrap();
        match mode {
            CatalogMode::Immediate => {}
            CatalogMode::NotFound => return Err(LookupError::NotFound),
            CatalogMode::Fail => return Err(LookupError::Transient("bad gateway".to_string())),
        }

        let title = self
            .titles
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("Item {id}"));
        Ok(ItemAttributes::new(title, Decimal::new(17990, 2)))
    }
}

/// Captures notifications for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<(NotifyLevel, String)>>,
}

impl RecordingNotifier {
    /// All notifications so far, oldest first.
    #[must_use]
    pub fn all(&self) -> Vec<(NotifyLevel, String)> {
        self.seen.lock().unwrap().clone()
    }

    /// The most recent notification.
    #[must_use]
    pub fn last(&self) -> (NotifyLevel, String) {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NotifyLevel, message: &str) {
        self.seen.lock().unwrap().push((level, message.to_string()));
    }
}

/// In-memory store that counts writes and can be told to reject them.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyStore {
    /// Store pre-seeded with a raw cart value.
    #[must_use]
    pub fn seeded(raw: &str) -> Self {
        Self {
            inner: MemoryStore::with_entry(CART_STORAGE_KEY, raw),
            ..Self::default()
        }
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// The stored cart, parsed.
    #[must_use]
    pub fn stored_cart(&self) -> Option<Cart> {
        self.get(CART_STORAGE_KEY)
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("storage quota exceeded".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }
}

/// A manager wired to stub collaborators, with handles to each of them.
pub struct TestCart {
    pub manager: CartManager<Arc<StubInventory>, Arc<StubCatalog>>,
    pub inventory: Arc<StubInventory>,
    pub catalog: Arc<StubCatalog>,
    pub store: Arc<FlakyStore>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestCart {
    /// Cart over an empty store with the given stock.
    #[must_use]
    pub fn new(items: &[(i32, u32)]) -> Self {
        Self::build(items, StubCatalog::default(), FlakyStore::default())
    }

    /// Cart with explicit catalog titles.
    #[must_use]
    pub fn with_titles(items: &[(i32, u32)], titles: &[(i32, &str)]) -> Self {
        Self::build(items, StubCatalog::with_titles(titles), FlakyStore::default())
    }

    /// Cart hydrated from an arbitrary raw stored value.
    #[must_use]
    pub fn from_stored(items: &[(i32, u32)], raw: &str) -> Self {
        Self::build(items, StubCatalog::default(), FlakyStore::seeded(raw))
    }

    fn build(items: &[(i32, u32)], catalog: StubCatalog, store: FlakyStore) -> Self {
        let inventory = StubInventory::with(items);
        let catalog = Arc::new(catalog);
        let store = Arc::new(store);
        let notifier = Arc::new(RecordingNotifier::default());
        let manager = CartManager::hydrate(
            Arc::clone(&inventory),
            Arc::clone(&catalog),
            CartStorage::new(Arc::clone(&store)),
            notifier.clone(),
        );
        Self {
            manager,
            inventory,
            catalog,
            store,
            notifier,
        }
    }

    /// The in-memory cart as a `Cart` value.
    #[must_use]
    pub fn in_memory(&self) -> Cart {
        Cart::from_lines(self.manager.cart()).unwrap()
    }

    /// Assert that storage holds exactly the in-memory cart.
    pub fn assert_persisted(&self) {
        assert_eq!(self.store.stored_cart(), Some(self.in_memory()));
    }
}
