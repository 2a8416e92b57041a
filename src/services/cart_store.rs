use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, instrument, warn};

use crate::models::{
    messages, Cart, CartError, CartResult, LineItem, Notice, ProductId, RepositoryError,
    StockTable, UpdateProductAmount,
};
use crate::observability::Metrics;
use crate::repositories::CartRepository;

use super::{CatalogClient, Notifier};

/// Stock checks applied when adding products
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockPolicy {
    /// Require stock ≥ 1 before a product's first line item is appended.
    /// Off by default: only increments of existing items are checked.
    pub check_first_add: bool,
}

/// Cart after an operation together with the notices that operation raised
#[derive(Debug, Clone, PartialEq)]
pub struct CartOutcome {
    pub cart: Cart,
    pub notices: Vec<Notice>,
}

/// Cart state plus the stock table it is validated against.
///
/// Every mutation runs validate, build a new cart, persist, then swap the
/// in-memory cart while holding the cart lock. A failed step leaves both the
/// persisted blob and the in-memory cart untouched. Persist and swap run on
/// their own task, so dropping a pending operation cannot split them.
pub struct CartStore {
    cart: Arc<Mutex<Cart>>,
    stock: StockTable,
    repository: CartRepository,
    catalog: Arc<dyn CatalogClient>,
    notifier: Arc<dyn Notifier>,
    policy: StockPolicy,
    metrics: Option<Arc<Metrics>>,
}

impl CartStore {
    /// Load the persisted cart and the stock listing.
    ///
    /// Neither step can fail initialization: an absent or unreadable blob gives an
    /// empty cart and a failed stock fetch gives an empty stock table.
    #[instrument(skip_all, fields(key = %repository.key()))]
    pub async fn initialize(
        repository: CartRepository,
        catalog: Arc<dyn CatalogClient>,
        notifier: Arc<dyn Notifier>,
        policy: StockPolicy,
    ) -> Self {
        let cart = match repository.load().await {
            Ok(Some(cart)) => cart,
            Ok(None) => {
                info!("No persisted cart, starting empty");
                Cart::new()
            }
            Err(e) => {
                warn!(error = %e, "Persisted cart is unreadable, starting empty");
                Cart::new()
            }
        };

        let stock = match catalog.fetch_stock().await {
            Ok(entries) => StockTable::new(entries),
            Err(e) => {
                warn!(error = %e, "Failed to fetch stock, treating every product as out of stock");
                StockTable::default()
            }
        };

        info!(
            items = cart.len(),
            stock_entries = stock.entries().len(),
            check_first_add = policy.check_first_add,
            "Cart store initialized"
        );

        Self {
            cart: Arc::new(Mutex::new(cart)),
            stock,
            repository,
            catalog,
            notifier,
            policy,
            metrics: None,
        }
    }

    /// Attach metrics and publish the initial cart size
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        if let Ok(cart) = self.cart.try_lock() {
            metrics.set_cart_size(&cart);
        }
        self.metrics = Some(metrics);
        self
    }

    /// Snapshot of the current cart
    pub async fn cart(&self) -> Cart {
        self.cart.lock().await.clone()
    }

    /// Stock table loaded at initialization
    pub fn stock(&self) -> &StockTable {
        &self.stock
    }

    pub fn policy(&self) -> StockPolicy {
        self.policy
    }

    /// Add one unit of `product_id`, reporting failures through the notifier
    pub async fn add_product(&self, product_id: ProductId) -> Cart {
        self.add_product_with_notices(product_id).await.cart
    }

    /// Remove the line item for `product_id`, reporting failures through the notifier
    pub async fn remove_product(&self, product_id: ProductId) -> Cart {
        self.remove_product_with_notices(product_id).await.cart
    }

    /// Set the amount of an existing line item, reporting failures through the notifier
    pub async fn update_product_amount(&self, update: UpdateProductAmount) -> Cart {
        self.update_product_amount_with_notices(update).await.cart
    }

    /// Like [`CartStore::add_product`], also returning the notices this call raised
    pub async fn add_product_with_notices(&self, product_id: ProductId) -> CartOutcome {
        let result = self.try_add_product(product_id).await;
        self.finish("add_product", result, |e| {
            vec![e.user_message(messages::ADD_FAILED)]
        })
        .await
    }

    pub async fn remove_product_with_notices(&self, product_id: ProductId) -> CartOutcome {
        let result = self.try_remove_product(product_id).await;
        self.finish("remove_product", result, |_| vec![messages::REMOVE_FAILED])
            .await
    }

    pub async fn update_product_amount_with_notices(
        &self,
        update: UpdateProductAmount,
    ) -> CartOutcome {
        let result = self.try_update_product_amount(update).await;
        self.finish("update_product_amount", result, |e| {
            vec![
                e.user_message(messages::UPDATE_FAILED),
                messages::UPDATE_FAILED,
            ]
        })
        .await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn try_add_product(&self, product_id: ProductId) -> CartResult<Cart> {
        let cart = self.cart.clone().lock_owned().await;
        let available = self.stock.available(product_id);

        let next = match cart.get(product_id) {
            Some(item) => {
                if item.amount >= available {
                    return Err(CartError::OutOfStock {
                        product_id,
                        requested: item.amount.saturating_add(1),
                        available,
                    });
                }
                cart.with_amount(product_id, item.amount + 1)
            }
            None => {
                if self.policy.check_first_add && available < 1 {
                    return Err(CartError::OutOfStock {
                        product_id,
                        requested: 1,
                        available,
                    });
                }
                let product = self.catalog.fetch_product(product_id).await?;
                cart.with_appended(LineItem::from_product(product))
            }
        };

        let next = self.commit(cart, next).await?;

        info!(items = next.len(), "Product added to cart");
        Ok(next)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn try_remove_product(&self, product_id: ProductId) -> CartResult<Cart> {
        let cart = self.cart.clone().lock_owned().await;

        if !cart.contains(product_id) {
            return Err(CartError::NotInCart { product_id });
        }

        let next = cart.without(product_id);
        let next = self.commit(cart, next).await?;

        info!(items = next.len(), "Product removed from cart");
        Ok(next)
    }

    #[instrument(skip(self), fields(product_id = %update.product_id, amount = update.amount))]
    pub async fn try_update_product_amount(&self, update: UpdateProductAmount) -> CartResult<Cart> {
        let UpdateProductAmount { product_id, amount } = update;
        let cart = self.cart.clone().lock_owned().await;

        let current = cart
            .get(product_id)
            .map(|item| item.amount)
            .ok_or(CartError::NotInCart { product_id })?;
        let available = self.stock.available(product_id);

        if current >= available || amount > available {
            return Err(CartError::OutOfStock {
                product_id,
                requested: amount,
                available,
            });
        }

        let next = cart.with_amount(product_id, amount);
        let next = self.commit(cart, next).await?;

        info!("Product amount updated");
        Ok(next)
    }

    /// Persist `next`, then swap it into memory while still holding the lock
    async fn commit(&self, mut cart: OwnedMutexGuard<Cart>, next: Cart) -> CartResult<Cart> {
        let repository = self.repository.clone();
        let task = tokio::spawn(async move {
            repository.save(&next).await?;
            *cart = next.clone();
            Ok::<_, CartError>(next)
        });

        task.await.map_err(|e| RepositoryError::Unavailable {
            message: format!("persist task failed: {e}"),
        })?
    }

    /// Convert an operation result into the cart snapshot and notices callers see
    async fn finish<F>(
        &self,
        operation: &str,
        result: CartResult<Cart>,
        to_messages: F,
    ) -> CartOutcome
    where
        F: FnOnce(&CartError) -> Vec<&'static str>,
    {
        match result {
            Ok(cart) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_cart_operation(operation, true);
                    metrics.set_cart_size(&cart);
                }
                CartOutcome {
                    cart,
                    notices: Vec::new(),
                }
            }
            Err(e) => {
                warn!(operation, error = %e, "Cart operation failed");
                if let Some(metrics) = &self.metrics {
                    metrics.record_cart_operation(operation, false);
                }
                let notices: Vec<Notice> = to_messages(&e)
                    .into_iter()
                    .map(Notice::error)
                    .collect();
                for notice in &notices {
                    self.notifier.notify(notice.clone());
                }
                CartOutcome {
                    cart: self.cart().await,
                    notices,
                }
            }
        }
    }
}
