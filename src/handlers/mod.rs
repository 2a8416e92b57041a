pub mod cart;
pub mod health;
pub mod metrics;

pub use cart::*;
pub use health::*;
pub use metrics::*;

use axum::{middleware, routing::get, Router};
use std::{sync::Arc, time::Duration};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

use crate::observability::{observability_middleware, Metrics};
use crate::services::{CartStore, ToastQueue};

/// Assemble the full application router.
///
/// `request_timeout` bounds the health and metrics routes only. Cart routes
/// are bounded by the catalog timeout and always answer 200 with notices.
pub fn create_app(
    store: Arc<CartStore>,
    toasts: Arc<ToastQueue>,
    metrics: Arc<Metrics>,
    request_timeout: Duration,
) -> Router {
    let metrics_for_middleware = metrics.clone();

    Router::new()
        .route("/health/status", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
        .layer(TimeoutLayer::new(request_timeout))
        .merge(create_cart_router(store, toasts))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}
