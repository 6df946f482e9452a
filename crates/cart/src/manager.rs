//! The cart manager.
//!
//! # Consistency
//!
//! Three copies of state are involved: the in-memory [`Cart`], the remote
//! stock levels, and the durable snapshot. Each operation:
//!
//! 1. takes the cart lock (held across every remote lookup, so operations on
//!    one cart never interleave),
//! 2. validates against fresh stock,
//! 3. builds the next cart as a copy,
//! 4. saves the copy to storage,
//! 5. only then replaces the in-memory cart and publishes it to observers.
//!
//! A failure at any step leaves memory, storage and observers at the last
//! committed state. A failed save is not rolled forward: the change is
//! dropped and reported at [`NotifyLevel::Critical`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rocketcart_core::{Cart, ItemId, LineItem, Quantity, StockRecord};
use tokio::sync::{Mutex, watch};
use tracing::instrument;

use crate::error::CartError;
use crate::inventory::{InventorySource, ItemCatalog, LookupError};
use crate::notify::{Notifier, NotifyLevel};
use crate::storage::{CartStorage, Snapshot};

/// What a successful operation changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// A new line was created with one unit.
    Added { id: ItemId },
    /// An existing line's quantity was replaced.
    QuantityChanged {
        id: ItemId,
        from: Quantity,
        to: Quantity,
    },
    /// A line was deleted.
    Removed { id: ItemId },
    /// Every line was deleted.
    Cleared,
}

impl CartChange {
    /// Message shown to the shopper.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Added { .. } => "Item added to cart",
            Self::QuantityChanged { from, to, .. } if to > from => "Item quantity increased",
            Self::QuantityChanged { from, to, .. } if to < from => "Item quantity decreased",
            Self::QuantityChanged { .. } => "Item quantity unchanged",
            Self::Removed { .. } => "Item removed from cart",
            Self::Cleared => "Cart cleared",
        }
    }
}

/// Owns one shopper's cart and mediates every change to it.
pub struct CartManager<I, C> {
    inventory: I,
    catalog: C,
    storage: CartStorage,
    notifier: Arc<dyn Notifier>,
    lookup_timeout: Option<Duration>,
    cart: Mutex<Cart>,
    published: watch::Sender<Vec<LineItem>>,
}

impl<I, C> std::fmt::Debug for CartManager<I, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartManager")
            .field("storage", &self.storage)
            .field("lookup_timeout", &self.lookup_timeout)
            .field("lines", &self.published.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<I, C> CartManager<I, C>
where
    I: InventorySource,
    C: ItemCatalog,
{
    /// Create a manager, restoring the cart from `storage`.
    ///
    /// A missing, unreadable or corrupt snapshot yields an empty cart.
    pub fn hydrate(
        inventory: I,
        catalog: C,
        storage: CartStorage,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let cart = match storage.load() {
            Ok(Snapshot::Loaded(cart)) => {
                tracing::info!(lines = cart.len(), "Restored cart from storage");
                cart
            }
            Ok(Snapshot::Absent) => Cart::new(),
            Ok(Snapshot::Corrupt(e)) => {
                tracing::warn!(error = %e, "Stored cart is corrupt, starting empty");
                Cart::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not read stored cart, starting empty");
                Cart::new()
            }
        };

        let (published, _) = watch::channel(cart.lines().to_vec());

        Self {
            inventory,
            catalog,
            storage,
            notifier,
            lookup_timeout: None,
            cart: Mutex::new(cart),
            published,
        }
    }

    /// Fail any single remote lookup that takes longer than `timeout`.
    #[must_use]
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = Some(timeout);
        self
    }

    /// Snapshot of the last committed cart.
    #[must_use]
    pub fn cart(&self) -> Vec<LineItem> {
        self.published.borrow().clone()
    }

    /// The committed line for `id`, if any.
    #[must_use]
    pub fn line(&self, id: ItemId) -> Option<LineItem> {
        self.published
            .borrow()
            .iter()
            .find(|line| line.id == id)
            .cloned()
    }

    /// Total units across all committed lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.published
            .borrow()
            .iter()
            .map(|line| u64::from(line.quantity.get()))
            .sum()
    }

    /// Observe committed carts. Uncommitted or rejected states are never sent.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<LineItem>> {
        self.published.subscribe()
    }

    /// Add one unit of `id`.
    ///
    /// A new item gets a line with quantity 1 if at least one unit is in
    /// stock. An item already in the cart is incremented through the same
    /// stock check as [`set_quantity`](Self::set_quantity).
    ///
    /// # Errors
    ///
    /// `InvalidItem`, `NotFound`, `OutOfStock`, `Transient` or `Persist`.
    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn add(&self, id: ItemId) -> Result<CartChange, CartError> {
        let result = self.try_add(id).await;
        self.report(&result);
        result
    }

    /// Delete the line for `id`.
    ///
    /// # Errors
    ///
    /// `InvalidItem`, `AlreadyAbsent` if there is no such line, or `Persist`.
    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn remove(&self, id: ItemId) -> Result<CartChange, CartError> {
        let result = self.try_remove(id).await;
        self.report(&result);
        result
    }

    /// Replace the quantity of an existing line.
    ///
    /// A quantity of 0 removes the line, exactly like [`remove`](Self::remove).
    /// Otherwise the quantity must not exceed current stock; increases and
    /// decreases are checked the same way.
    ///
    /// # Errors
    ///
    /// `InvalidItem`, `NotInCart`, `AlreadyAbsent` (quantity 0 on a missing
    /// line), `NotFound`, `OutOfStock`, `Transient` or `Persist`.
    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn set_quantity(&self, id: ItemId, quantity: u32) -> Result<CartChange, CartError> {
        let result = self.try_set_quantity(id, quantity).await;
        self.report(&result);
        result
    }

    /// Delete every line. Clearing an empty cart still succeeds.
    ///
    /// # Errors
    ///
    /// `Persist` if the empty cart could not be saved.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<CartChange, CartError> {
        let result = self.try_clear().await;
        self.report(&result);
        result
    }

    async fn try_add(&self, id: ItemId) -> Result<CartChange, CartError> {
        ensure_well_formed(id)?;
        let mut cart = self.cart.lock().await;

        let stock = self.lookup(id, self.inventory.get_stock(id)).await?;

        if let Some(line) = cart.get(id) {
            let Some(requested) = line.quantity.incremented() else {
                return Err(CartError::OutOfStock {
                    id,
                    requested: u32::MAX,
                    available: stock.available,
                });
            };
            return self.apply_quantity(&mut cart, id, requested, stock);
        }

        if stock.available < 1 {
            return Err(CartError::OutOfStock {
                id,
                requested: 1,
                available: stock.available,
            });
        }

        let attributes = self.lookup(id, self.catalog.get_item(id)).await?;

        let mut next = cart.clone();
        next.insert(LineItem::new(id, attributes, Quantity::ONE))?;
        self.commit(&mut cart, next)?;
        Ok(CartChange::Added { id })
    }

    async fn try_remove(&self, id: ItemId) -> Result<CartChange, CartError> {
        ensure_well_formed(id)?;
        let mut cart = self.cart.lock().await;
        self.remove_locked(&mut cart, id)
    }

    async fn try_clear(&self) -> Result<CartChange, CartError> {
        let mut cart = self.cart.lock().await;
        self.commit(&mut cart, Cart::new())?;
        Ok(CartChange::Cleared)
    }

    async fn try_set_quantity(&self, id: ItemId, quantity: u32) -> Result<CartChange, CartError> {
        ensure_well_formed(id)?;
        let mut cart = self.cart.lock().await;

        let Ok(requested) = Quantity::new(quantity) else {
            return self.remove_locked(&mut cart, id);
        };

        if !cart.contains(id) {
            return Err(CartError::NotInCart(id));
        }

        let stock = self.lookup(id, self.inventory.get_stock(id)).await?;
        self.apply_quantity(&mut cart, id, requested, stock)
    }

    /// Set a line's quantity against an already-fetched stock record.
    fn apply_quantity(
        &self,
        cart: &mut Cart,
        id: ItemId,
        requested: Quantity,
        stock: StockRecord,
    ) -> Result<CartChange, CartError> {
        if !stock.covers(requested) {
            return Err(CartError::OutOfStock {
                id,
                requested: requested.get(),
                available: stock.available,
            });
        }

        let mut next = cart.clone();
        let from = next.set_quantity(id, requested)?;
        self.commit(cart, next)?;
        Ok(CartChange::QuantityChanged {
            id,
            from,
            to: requested,
        })
    }

    fn remove_locked(&self, cart: &mut Cart, id: ItemId) -> Result<CartChange, CartError> {
        if !cart.contains(id) {
            return Err(CartError::AlreadyAbsent(id));
        }

        let mut next = cart.clone();
        next.remove(id)?;
        self.commit(cart, next)?;
        Ok(CartChange::Removed { id })
    }

    /// Write `next` through to storage, then make it the current cart.
    fn commit(&self, cart: &mut Cart, next: Cart) -> Result<(), CartError> {
        self.storage.save(&next)?;
        *cart = next;
        self.published.send_replace(cart.lines().to_vec());
        Ok(())
    }

    /// Await a remote lookup, applying the configured timeout.
    async fn lookup<T>(
        &self,
        id: ItemId,
        request: impl Future<Output = Result<T, LookupError>>,
    ) -> Result<T, CartError> {
        let result = match self.lookup_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .unwrap_or_else(|_| {
                    Err(LookupError::Transient(format!(
                        "lookup timed out after {}ms",
                        limit.as_millis()
                    )))
                }),
            None => request.await,
        };
        result.map_err(|e| CartError::from_lookup(id, e))
    }

    /// Log and notify the outcome of an operation.
    fn report(&self, result: &Result<CartChange, CartError>) {
        match result {
            Ok(change) => {
                tracing::info!(?change, "Cart updated");
                self.notifier.notify(NotifyLevel::Success, change.message());
            }
            Err(e) => {
                if e.is_rejection() {
                    tracing::info!(error = %e, "Cart change rejected");
                } else if e.notify_level() == NotifyLevel::Critical {
                    tracing::error!(error = %e, "Cart change not persisted");
                } else {
                    tracing::warn!(error = %e, "Cart change failed");
                }
                self.notifier.notify(e.notify_level(), e.user_message());
            }
        }
    }
}

const fn ensure_well_formed(id: ItemId) -> Result<(), CartError> {
    if id.is_well_formed() {
        Ok(())
    } else {
        Err(CartError::InvalidItem(id))
    }
}
