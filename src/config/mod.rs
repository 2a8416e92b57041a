use reqwest::Url;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::services::StockPolicy;

/// Prefix of every environment variable read by [`Config::from_environment`]
pub const ENV_PREFIX: &str = "CART";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {message}")]
    LoadError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub storage: StorageConfig,
    pub cart: CartConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,
    #[serde(default = "default_catalog_timeout")]
    pub catalog_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartConfig {
    #[serde(default)]
    pub check_stock_on_first_add: bool,
    #[serde(default = "default_toast_capacity")]
    pub toast_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub enable_json_logging: bool,
}

impl Config {
    /// Load and validate configuration from `CART_`-prefixed environment variables
    pub fn from_environment() -> Result<Self, ConfigError> {
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX))
    }

    pub(crate) fn from_source(environment: config::Environment) -> Result<Self, ConfigError> {
        info!("Loading configuration from environment");

        let settings = config::Config::builder()
            .add_source(environment)
            .build()
            .map_err(|e| ConfigError::LoadError {
                message: format!("Failed to load config: {}", e),
            })?;

        let config = Config {
            server: section(&settings, "server")?,
            catalog: section(&settings, "catalog")?,
            storage: section(&settings, "storage")?,
            cart: section(&settings, "cart")?,
            observability: section(&settings, "observability")?,
        };

        config.validate()?;

        info!("Configuration loaded successfully");
        debug!("Configuration: {:?}", config);

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(validation("Server port cannot be 0"));
        }

        if self.server.request_timeout_seconds == 0 {
            return Err(validation("Request timeout cannot be 0"));
        }

        if self.catalog.catalog_timeout_seconds == 0 {
            return Err(validation("Catalog timeout cannot be 0"));
        }

        self.catalog.base_url()?;

        if self.storage.storage_key.trim().is_empty() {
            return Err(validation("Storage key cannot be empty"));
        }

        if self.cart.toast_capacity == 0 {
            return Err(validation("Toast capacity cannot be 0"));
        }

        Ok(())
    }
}

/// Deserialize one section from the flat settings map
fn section<T: serde::de::DeserializeOwned>(
    settings: &config::Config,
    name: &str,
) -> Result<T, ConfigError> {
    settings
        .clone()
        .try_deserialize()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to deserialize {} config: {}", name, e),
        })
}

fn validation(message: &str) -> ConfigError {
    ConfigError::ValidationError {
        message: message.to_string(),
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl CatalogConfig {
    /// Parsed catalog base URL; only http and https are accepted
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.catalog_url).map_err(|e| ConfigError::ValidationError {
            message: format!("Invalid catalog URL {:?}: {}", self.catalog_url, e),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::ValidationError {
                message: format!("Unsupported catalog URL scheme: {}", scheme),
            }),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_seconds)
    }
}

impl CartConfig {
    pub fn stock_policy(&self) -> StockPolicy {
        StockPolicy {
            check_first_add: self.check_stock_on_first_add,
        }
    }
}

impl ObservabilityConfig {
    /// Configured OTLP endpoint, treating a blank value as unset
    pub fn otlp_endpoint(&self) -> Option<&str> {
        self.otlp_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
    }
}

// Default value functions
pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    3333
}

pub(crate) fn default_timeout() -> u64 {
    30
}

pub(crate) fn default_catalog_url() -> String {
    "http://localhost:3333".to_string()
}

pub(crate) fn default_catalog_timeout() -> u64 {
    10
}

pub(crate) fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

pub(crate) fn default_storage_key() -> String {
    crate::repositories::DEFAULT_CART_KEY.to_string()
}

pub(crate) fn default_toast_capacity() -> usize {
    32
}

pub(crate) fn default_service_name() -> String {
    "storefront-cart".to_string()
}

pub(crate) fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}
