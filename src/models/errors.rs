use thiserror::Error;

use super::notice::messages;
use super::ProductId;

/// Errors raised by cart store operations
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Out of stock: product_id={product_id}, requested={requested}, available={available}")]
    OutOfStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    #[error("Product not in cart: {product_id}")]
    NotInCart { product_id: ProductId },

    #[error("Catalog error: {source}")]
    Catalog {
        #[from]
        source: CatalogError,
    },

    #[error("Repository error: {source}")]
    Repository {
        #[from]
        source: RepositoryError,
    },
}

impl CartError {
    /// Message shown to the user when this error ends an operation.
    ///
    /// Stock and catalog lookups have their own messages; anything else falls
    /// back to the failing operation's generic message.
    pub fn user_message(&self, fallback: &'static str) -> &'static str {
        match self {
            CartError::OutOfStock { .. } => messages::OUT_OF_STOCK,
            CartError::Catalog {
                source: CatalogError::ProductNotFound { .. },
            } => messages::PRODUCT_NOT_FOUND,
            CartError::NotInCart { .. }
            | CartError::Catalog { .. }
            | CartError::Repository { .. } => fallback,
        }
    }
}

/// Errors talking to the remote catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {endpoint}: {body}")]
    UnexpectedStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors from the persistence channel
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Storage I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },
}

/// Result type alias for cart store operations
pub type CartResult<T> = Result<T, CartError>;

/// Result type alias for catalog calls
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;
