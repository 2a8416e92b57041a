use async_trait::async_trait;
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::models::{CatalogError, CatalogResult, ProductId, ProductRecord, StockEntry};
use crate::observability::Metrics;

/// Remote source of product records and stock levels
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch the full stock listing
    async fn fetch_stock(&self) -> CatalogResult<Vec<StockEntry>>;

    /// Fetch a single product record by id
    async fn fetch_product(&self, product_id: ProductId) -> CatalogResult<ProductRecord>;
}

/// Catalog client speaking the storefront's JSON API over HTTP.
///
/// - `GET {base}/stock` returns an array of stock entries
/// - `GET {base}/products?id={id}` returns an array whose first element is the product
pub struct HttpCatalogClient {
    client: reqwest::Client,
    base_url: Url,
    metrics: Option<Arc<Metrics>>,
}

impl HttpCatalogClient {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: Url, timeout: Duration) -> CatalogResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: with_trailing_slash(base_url),
            metrics: None,
        })
    }

    /// Attach metrics recording for catalog requests
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> CatalogResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| CatalogError::InvalidUrl(e.to_string()))
    }

    /// GET `url` and return the body of a successful response
    async fn get_text(&self, endpoint: &str, url: Url) -> CatalogResult<String> {
        let result = self.send(endpoint, url).await;
        if let Some(metrics) = &self.metrics {
            metrics.record_catalog_request(endpoint, result.is_ok());
        }
        result
    }

    async fn send(&self, endpoint: &str, url: Url) -> CatalogResult<String> {
        debug!(%url, "Sending catalog request");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(
                endpoint,
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Catalog returned non-success status"
            );
            return Err(CatalogError::UnexpectedStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        Ok(body)
    }
}

/// `Url::join` drops the last path segment unless the base ends with `/`
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    #[instrument(skip(self))]
    async fn fetch_stock(&self) -> CatalogResult<Vec<StockEntry>> {
        let url = self.endpoint("stock")?;
        let body = self.get_text("stock", url).await?;

        let stock: Vec<StockEntry> = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "Failed to parse stock listing");
            CatalogError::Parse(e)
        })?;

        debug!(entries = stock.len(), "Fetched stock listing");
        Ok(stock)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn fetch_product(&self, product_id: ProductId) -> CatalogResult<ProductRecord> {
        let mut url = self.endpoint("products")?;
        url.query_pairs_mut()
            .append_pair("id", &product_id.to_string());

        let body = self.get_text("products", url).await?;

        let products: Vec<ProductRecord> = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "Failed to parse product listing");
            CatalogError::Parse(e)
        })?;

        products
            .into_iter()
            .next()
            .ok_or(CatalogError::ProductNotFound { product_id })
    }
}
