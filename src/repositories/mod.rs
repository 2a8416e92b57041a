pub mod cart_repository;
pub mod storage;

pub use cart_repository::{CartRepository, DEFAULT_CART_KEY};
pub use storage::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore};
