//! HTTP implementation of the inventory source and item catalog.
//!
//! Talks to the store's REST API:
//! - `GET {base}/stock/{id}` → `{ "id": 1, "amount": 3 }`
//! - `GET {base}/products/{id}` → `{ "id": 1, "title": "...", "price": 139.9, "image": "..." }`
//!
//! A 404 means the item does not exist. Every other failure (connection,
//! timeout, non-success status, unreadable body) is transient.

use std::sync::Arc;

use reqwest::StatusCode;
use rocketcart_core::{ItemAttributes, ItemId, StockRecord};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use crate::config::ApiConfig;
use crate::inventory::{InventorySource, ItemCatalog, LookupError};

/// Client for the store API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct HttpApi {
    inner: Arc<HttpApiInner>,
}

struct HttpApiInner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl std::fmt::Debug for HttpApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApi")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Product payload: the id plus the attributes the cart keeps.
#[derive(Debug, Deserialize)]
struct ProductResponse {
    #[allow(dead_code)]
    id: ItemId,
    #[serde(flatten)]
    attributes: ItemAttributes,
}

impl HttpApi {
    /// Create a client for the API described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpApiInner {
                client,
                base_url: with_trailing_slash(config.base_url.clone()),
                token: config.token.clone(),
            }),
        })
    }

    /// URL of `resource/{id}` under the base URL.
    fn endpoint(&self, resource: &str, id: ItemId) -> Result<Url, LookupError> {
        self.inner
            .base_url
            .join(&format!("{resource}/{id}"))
            .map_err(|e| LookupError::Transient(format!("invalid endpoint: {e}")))
    }

    /// Fetch and decode `resource/{id}`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        id: ItemId,
    ) -> Result<T, LookupError> {
        let url = self.endpoint(resource, id)?;

        let mut request = self.inner.client.get(url);
        if let Some(token) = &self.inner.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(transient)?;
        check_status(response.status())?;

        let body = response.text().await.map_err(transient)?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse store API response"
            );
            LookupError::Transient(format!("malformed response: {e}"))
        })
    }
}

impl InventorySource for HttpApi {
    #[instrument(skip(self), fields(item_id = %id))]
    async fn get_stock(&self, id: ItemId) -> Result<StockRecord, LookupError> {
        let stock: StockRecord = self.get_json("stock", id).await?;
        tracing::debug!(available = stock.available, "Fetched stock");
        Ok(stock)
    }
}

impl ItemCatalog for HttpApi {
    #[instrument(skip(self), fields(item_id = %id))]
    async fn get_item(&self, id: ItemId) -> Result<ItemAttributes, LookupError> {
        let product: ProductResponse = self.get_json("products", id).await?;
        Ok(product.attributes)
    }
}

/// Map an HTTP status to a lookup outcome.
fn check_status(status: StatusCode) -> Result<(), LookupError> {
    if status == StatusCode::NOT_FOUND {
        return Err(LookupError::NotFound);
    }
    if !status.is_success() {
        tracing::warn!(status = %status, "Store API returned non-success status");
        return Err(LookupError::Transient(format!("HTTP {status}")));
    }
    Ok(())
}

#[allow(clippy::needless_pass_by_value)]
fn transient(err: reqwest::Error) -> LookupError {
    if err.is_timeout() {
        LookupError::Transient("request timed out".to_string())
    } else {
        LookupError::Transient(err.to_string())
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
