use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{Cart, Notice, ProductId, StockTable, UpdateProductAmount};
use crate::services::{CartOutcome, CartStore, ToastQueue};

/// Cart as presented to views
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Cart,
    pub total_items: u64,
    pub total: Decimal,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self {
            total_items: cart.total_items(),
            total: cart.total(),
            items: cart,
        }
    }
}

/// Result of a cart mutation: the cart after the operation plus any notices it raised
#[derive(Debug, Serialize)]
pub struct CartMutationResponse {
    pub cart: CartView,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Deserialize)]
pub struct AddProductRequest {
    pub product_id: ProductId,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAmountRequest {
    pub amount: u32,
}

/// State for cart handlers
#[derive(Clone)]
pub struct CartHandlerState {
    pub store: Arc<CartStore>,
    pub toasts: Arc<ToastQueue>,
}

impl CartHandlerState {
    /// Answer with this operation's notices; they are no longer pending afterwards
    fn respond(&self, outcome: CartOutcome) -> Json<CartMutationResponse> {
        let ids: Vec<_> = outcome.notices.iter().map(|notice| notice.id).collect();
        self.toasts.acknowledge(&ids);

        Json(CartMutationResponse {
            cart: outcome.cart.into(),
            notices: outcome.notices,
        })
    }
}

/// Create cart router with all endpoints
pub fn create_cart_router(store: Arc<CartStore>, toasts: Arc<ToastQueue>) -> Router {
    let state = CartHandlerState { store, toasts };

    Router::new()
        .route("/api/cart", get(get_cart))
        .route("/api/cart/items", post(add_product))
        .route(
            "/api/cart/items/:product_id",
            put(update_product_amount).delete(remove_product),
        )
        .route("/api/stock", get(get_stock))
        .route("/api/notifications", get(drain_notifications))
        .with_state(state)
}

#[instrument(skip(state))]
pub async fn get_cart(State(state): State<CartHandlerState>) -> Json<CartView> {
    Json(state.store.cart().await.into())
}

#[instrument(skip(state, request), fields(product_id = %request.product_id))]
pub async fn add_product(
    State(state): State<CartHandlerState>,
    Json(request): Json<AddProductRequest>,
) -> Json<CartMutationResponse> {
    info!("Adding product to cart");
    let outcome = state
        .store
        .add_product_with_notices(request.product_id)
        .await;
    state.respond(outcome)
}

#[instrument(skip(state, request), fields(amount = request.amount))]
pub async fn update_product_amount(
    State(state): State<CartHandlerState>,
    Path(product_id): Path<ProductId>,
    Json(request): Json<UpdateAmountRequest>,
) -> Json<CartMutationResponse> {
    info!("Updating product amount");
    let outcome = state
        .store
        .update_product_amount_with_notices(UpdateProductAmount {
            product_id,
            amount: request.amount,
        })
        .await;
    state.respond(outcome)
}

#[instrument(skip(state))]
pub async fn remove_product(
    State(state): State<CartHandlerState>,
    Path(product_id): Path<ProductId>,
) -> Json<CartMutationResponse> {
    info!("Removing product from cart");
    let outcome = state.store.remove_product_with_notices(product_id).await;
    state.respond(outcome)
}

pub async fn get_stock(State(state): State<CartHandlerState>) -> Json<StockTable> {
    Json(state.store.stock().clone())
}

/// Pending notices not yet delivered with a mutation response
pub async fn drain_notifications(State(state): State<CartHandlerState>) -> Json<Vec<Notice>> {
    Json(state.toasts.drain())
}
