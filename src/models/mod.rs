// Re-export all model types
pub use self::cart::*;
pub use self::errors::*;
pub use self::notice::*;
pub use self::stock::*;

mod cart;
mod errors;
mod notice;
mod stock;
