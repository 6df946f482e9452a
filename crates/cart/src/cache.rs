//! Caching wrapper for item catalogs.
//!
//! Item attributes are static, so repeated lookups are served from a
//! `moka` cache. Stock is never cached: availability must always come
//! from the inventory source.

use std::time::Duration;

use moka::future::Cache;
use rocketcart_core::{ItemAttributes, ItemId};

use crate::inventory::{ItemCatalog, LookupError};

const MAX_CACHED_ITEMS: u64 = 1000;

/// An [`ItemCatalog`] that remembers successful lookups for a fixed TTL.
///
/// Failures are not cached, so a transient error is retried on the next call.
#[derive(Clone)]
pub struct CachedCatalog<C> {
    inner: C,
    cache: Cache<ItemId, ItemAttributes>,
}

impl<C> CachedCatalog<C> {
    /// Wrap `inner`, caching attributes for `ttl`.
    #[must_use]
    pub fn new(inner: C, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_CACHED_ITEMS)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }
}

impl<C: ItemCatalog> ItemCatalog for CachedCatalog<C> {
    async fn get_item(&self, id: ItemId) -> Result<ItemAttributes, LookupError> {
        if let Some(attributes) = self.cache.get(&id).await {
            tracing::debug!(item_id = %id, "Catalog cache hit");
            return Ok(attributes);
        }

        let attributes = self.inner.get_item(id).await?;
        self.cache.insert(id, attributes.clone()).await;
        Ok(attributes)
    }
}
