// Services module - cart state and its collaborators

pub mod cart_store;
pub mod catalog;
pub mod notifier;

pub use cart_store::{CartOutcome, CartStore, StockPolicy};
pub use catalog::{CatalogClient, HttpCatalogClient};
pub use notifier::{LogNotifier, Notifier, ToastQueue};
