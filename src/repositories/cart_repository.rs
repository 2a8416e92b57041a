use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::models::{Cart, LineItem, RepositoryResult};

use super::KeyValueStore;

/// Default storage key for the persisted cart
pub const DEFAULT_CART_KEY: &str = "@RocketShoes:cart";

/// Reads and writes the cart as a single JSON blob under a fixed key
#[derive(Clone)]
pub struct CartRepository {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl CartRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Repository using [`DEFAULT_CART_KEY`]
    pub fn with_default_key(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, DEFAULT_CART_KEY)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the persisted cart; `None` when nothing has been stored yet
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn load(&self) -> RepositoryResult<Option<Cart>> {
        let Some(blob) = self.store.get(&self.key).await? else {
            return Ok(None);
        };

        let items: Vec<LineItem> = serde_json::from_str(&blob)?;
        let cart = Cart::from_items(items.clone());
        if cart.len() != items.len() {
            warn!(
                stored = items.len(),
                kept = cart.len(),
                "Persisted cart had duplicate product ids, keeping first occurrences"
            );
        }

        info!(items = cart.len(), "Loaded persisted cart");
        Ok(Some(cart))
    }

    /// Replace the persisted cart with `cart`
    #[instrument(skip(self, cart), fields(key = %self.key, items = cart.len()))]
    pub async fn save(&self, cart: &Cart) -> RepositoryResult<()> {
        let blob = serde_json::to_string(cart)?;
        self.store.set(&self.key, blob).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProductId, RepositoryError};
    use crate::repositories::InMemoryKeyValueStore;
    use async_trait::async_trait;
    use mockall::mock;
    use serde_json::json;

    mock! {
        TestKeyValueStore {}

        #[async_trait]
        impl KeyValueStore for TestKeyValueStore {
            async fn get(&self, key: &str) -> RepositoryResult<Option<String>>;
            async fn set(&self, key: &str, value: String) -> RepositoryResult<()>;
        }
    }

    fn create_test_cart() -> Cart {
        serde_json::from_value(json!([
            { "id": 1, "amount": 2, "title": "Tênis de Caminhada Leve Confortável", "price": 179.9 },
            { "id": 4, "amount": 1, "title": "Tênis Adidas Duramo Lite 2.0", "price": 219.9 }
        ]))
        .unwrap()
    }

    #[tokio::test]
    async fn test_load_absent_blob() {
        let mut mock_store = MockTestKeyValueStore::new();
        mock_store
            .expect_get()
            .with(mockall::predicate::eq(DEFAULT_CART_KEY.to_string()))
            .times(1)
            .returning(|_| Ok(None));

        let repository = CartRepository::with_default_key(Arc::new(mock_store));

        let result = repository.load().await;
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let repository = CartRepository::new(Arc::new(InMemoryKeyValueStore::new()), "cart");
        let cart = create_test_cart();

        repository.save(&cart).await.unwrap();
        let loaded = repository.load().await.unwrap().unwrap();

        assert_eq!(loaded, cart);
    }

    #[tokio::test]
    async fn test_save_writes_bare_array_under_key() {
        let mut mock_store = MockTestKeyValueStore::new();
        mock_store
            .expect_set()
            .withf(|key, value| {
                let parsed: serde_json::Value = serde_json::from_str(value).unwrap();
                key == "@RocketShoes:cart" && parsed.is_array() && parsed[0]["id"] == 1
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let repository = CartRepository::with_default_key(Arc::new(mock_store));

        repository.save(&create_test_cart()).await.unwrap();
    }

    #[tokio::test]
    async fn test_load_collapses_duplicate_ids() {
        let blob = json!([
            { "id": 1, "amount": 2 },
            { "id": 1, "amount": 5 },
            { "id": 2, "amount": 1 }
        ])
        .to_string();
        let store = InMemoryKeyValueStore::with_entry(DEFAULT_CART_KEY, blob);
        let repository = CartRepository::with_default_key(Arc::new(store));

        let cart = repository.load().await.unwrap().unwrap();

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().amount, 2);
    }

    #[tokio::test]
    async fn test_load_corrupt_blob_is_serialization_error() {
        let store = InMemoryKeyValueStore::with_entry(DEFAULT_CART_KEY, "{not json");
        let repository = CartRepository::with_default_key(Arc::new(store));

        match repository.load().await {
            Err(RepositoryError::Serialization { .. }) => {}
            other => panic!("Expected Serialization error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_save_propagates_store_failure() {
        let mut mock_store = MockTestKeyValueStore::new();
        mock_store.expect_set().times(1).returning(|_, _| {
            Err(RepositoryError::Unavailable {
                message: "quota exceeded".to_string(),
            })
        });

        let repository = CartRepository::with_default_key(Arc::new(mock_store));

        let result = repository.save(&Cart::new()).await;
        assert!(result.is_err());
    }
}
