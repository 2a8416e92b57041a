use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use storefront_cart::{
    create_app, init_observability,
    observability::{Metrics, ObservabilitySettings},
    repositories::{CartRepository, FileKeyValueStore},
    services::{CartStore, HttpCatalogClient, ToastQueue},
    shutdown_observability, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_environment()?;

    init_observability(&ObservabilitySettings {
        service_name: &config.observability.service_name,
        service_version: &config.observability.service_version,
        otlp_endpoint: config.observability.otlp_endpoint(),
        log_level: &config.observability.log_level,
        json_logging: config.observability.enable_json_logging,
    })?;

    info!(
        service = %config.observability.service_name,
        version = %config.observability.service_version,
        catalog_url = %config.catalog.catalog_url,
        data_dir = %config.storage.data_dir.display(),
        "Starting cart service"
    );

    let metrics = Arc::new(Metrics::new()?);

    let catalog = HttpCatalogClient::new(config.catalog.base_url()?, config.catalog.timeout())
        .context("Failed to build catalog client")?
        .with_metrics(metrics.clone());

    let toasts = Arc::new(ToastQueue::new(config.cart.toast_capacity).with_metrics(metrics.clone()));

    let repository = CartRepository::new(
        Arc::new(FileKeyValueStore::new(&config.storage.data_dir)),
        config.storage.storage_key.clone(),
    );

    let store = CartStore::initialize(
        repository,
        Arc::new(catalog),
        toasts.clone(),
        config.cart.stock_policy(),
    )
    .await
    .with_metrics(metrics.clone());

    let app = create_app(
        Arc::new(store),
        toasts,
        metrics,
        config.server.request_timeout(),
    );

    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_address()))?;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_observability().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
