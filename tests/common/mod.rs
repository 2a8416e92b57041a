#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::{json, Value};
use storefront_cart::{
    create_app,
    observability::Metrics,
    repositories::{CartRepository, FileKeyValueStore, DEFAULT_CART_KEY},
    services::{CartStore, HttpCatalogClient, ToastQueue},
    StockPolicy,
};
use tempfile::TempDir;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A running cart server backed by a mock catalog and a temporary data directory
pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
    pub catalog: MockServer,
    pub data_dir: TempDir,
}

pub struct TestEnvironmentBuilder {
    stock: Option<Value>,
    persisted: Option<String>,
    policy: StockPolicy,
}

impl TestEnvironmentBuilder {
    /// Stock listing served by the catalog; the stock endpoint fails when unset
    pub fn stock(mut self, stock: Value) -> Self {
        self.stock = Some(stock);
        self
    }

    /// Raw blob present in storage before the server starts
    pub fn persisted(mut self, blob: impl Into<String>) -> Self {
        self.persisted = Some(blob.into());
        self
    }

    pub fn policy(mut self, policy: StockPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn start(self) -> TestEnvironment {
        let catalog = MockServer::start().await;
        let stock_response = match self.stock {
            Some(stock) => ResponseTemplate::new(200).set_body_json(stock),
            None => ResponseTemplate::new(500).set_body_string("stock unavailable"),
        };
        Mock::given(method("GET"))
            .and(path("/stock"))
            .respond_with(stock_response)
            .mount(&catalog)
            .await;

        let data_dir = TempDir::new().unwrap();
        let file_store = FileKeyValueStore::new(data_dir.path());
        if let Some(blob) = self.persisted {
            std::fs::write(file_store.path_for(DEFAULT_CART_KEY), blob).unwrap();
        }

        let metrics = Arc::new(Metrics::new().unwrap());
        let catalog_client =
            HttpCatalogClient::new(Url::parse(&catalog.uri()).unwrap(), Duration::from_secs(5))
                .unwrap()
                .with_metrics(metrics.clone());
        let toasts = Arc::new(ToastQueue::new(16).with_metrics(metrics.clone()));

        let store = CartStore::initialize(
            CartRepository::with_default_key(Arc::new(file_store)),
            Arc::new(catalog_client),
            toasts.clone(),
            self.policy,
        )
        .await
        .with_metrics(metrics.clone());

        let app = create_app(Arc::new(store), toasts, metrics, Duration::from_secs(10));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestEnvironment {
            client: Client::new(),
            base_url: format!("http://{}", addr),
            catalog,
            data_dir,
        }
    }
}

impl TestEnvironment {
    pub fn builder() -> TestEnvironmentBuilder {
        TestEnvironmentBuilder {
            stock: None,
            persisted: None,
            policy: StockPolicy::default(),
        }
    }

    /// Serve a product record for `id` from the catalog
    pub async fn mount_product(&self, id: u64, title: &str, price: f64) {
        Mock::given(method("GET"))
            .and(path("/products"))
            .and(query_param("id", id.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": id,
                "title": title,
                "price": price,
                "image": format!("https://cdn.example.com/{id}.jpg")
            }])))
            .mount(&self.catalog)
            .await;
    }

    /// Make the catalog answer an empty listing for `id`
    pub async fn mount_missing_product(&self, id: u64) {
        Mock::given(method("GET"))
            .and(path("/products"))
            .and(query_param("id", id.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&self.catalog)
            .await;
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Contents of the persisted cart file, parsed
    pub fn persisted_cart(&self) -> Option<Value> {
        let path = FileKeyValueStore::new(self.data_dir.path()).path_for(DEFAULT_CART_KEY);
        let contents = std::fs::read_to_string(path).ok()?;
        Some(serde_json::from_str(&contents).unwrap())
    }

    pub async fn get_json(&self, path: &str) -> Value {
        self.client
            .get(self.url(path))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    pub async fn add_product(&self, product_id: u64) -> Value {
        self.client
            .post(self.url("/api/cart/items"))
            .json(&json!({ "product_id": product_id }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    pub async fn update_amount(&self, product_id: u64, amount: u32) -> Value {
        self.client
            .put(self.url(&format!("/api/cart/items/{product_id}")))
            .json(&json!({ "amount": amount }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    pub async fn remove_product(&self, product_id: u64) -> Value {
        self.client
            .delete(self.url(&format!("/api/cart/items/{product_id}")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }
}

/// Messages of the notices carried by a mutation response
pub fn notice_messages(response: &Value) -> Vec<String> {
    response["notices"]
        .as_array()
        .map(|notices| {
            notices
                .iter()
                .filter_map(|notice| notice["message"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
