use serde::{Deserialize, Serialize};

use super::ProductId;

/// Maximum purchasable quantity reported by the catalog for one product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    pub id: ProductId,
    pub amount: u32,
}

/// Stock listing loaded once when the store starts.
///
/// A product missing from the listing reads as zero stock, the same as a
/// product that is sold out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockTable {
    entries: Vec<StockEntry>,
}

impl StockTable {
    pub fn new(entries: Vec<StockEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[StockEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Available quantity for `product_id`; the first matching entry wins
    pub fn available(&self, product_id: ProductId) -> u32 {
        self.entries
            .iter()
            .find(|entry| entry.id == product_id)
            .map(|entry| entry.amount)
            .unwrap_or(0)
    }
}

impl From<Vec<StockEntry>> for StockTable {
    fn from(entries: Vec<StockEntry>) -> Self {
        Self::new(entries)
    }
}
