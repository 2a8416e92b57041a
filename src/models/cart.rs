use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Catalog identifier of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(u64);

impl ProductId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Product record as served by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// One product entry in the cart with its quantity.
///
/// Product fields other than `id` and `amount` are carried through untouched,
/// so whatever the catalog serves ends up in the persisted blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub amount: u32,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Ordered list of line items, unique by product id.
///
/// Serializes as a bare JSON array. Every mutating helper returns a new cart
/// and leaves `self` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

/// Request to overwrite the amount of a product already in the cart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    pub amount: u32,
}

impl LineItem {
    /// Build a line item for a product added for the first time
    pub fn from_product(product: ProductRecord) -> Self {
        let mut fields = product.fields;
        // the catalog record may carry its own amount; the cart's wins
        fields.remove("amount");
        Self {
            id: product.id,
            amount: 1,
            fields,
        }
    }

    pub fn with_amount(&self, amount: u32) -> Self {
        Self {
            amount,
            ..self.clone()
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.fields
            .get("title")
            .or_else(|| self.fields.get("name"))
            .and_then(Value::as_str)
    }

    pub fn image(&self) -> Option<&str> {
        self.fields.get("image").and_then(Value::as_str)
    }

    /// Unit price, when the product record carries a numeric or numeric-string price
    pub fn price(&self) -> Option<Decimal> {
        match self.fields.get("price")? {
            Value::Number(n) => n.to_string().parse().ok(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Price times amount, saturating at the `Decimal` bounds
    pub fn total_price(&self) -> Option<Decimal> {
        self.price()
            .map(|price| price.saturating_mul(Decimal::from(self.amount)))
    }
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from raw items, keeping the first occurrence of each id
    pub fn from_items(items: Vec<LineItem>) -> Self {
        let mut seen = HashSet::new();
        let items = items
            .into_iter()
            .filter(|item| seen.insert(item.id))
            .collect();
        Self { items }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn get(&self, product_id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == product_id)
    }

    pub fn contains(&self, product_id: ProductId) -> bool {
        self.get(product_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when no two items share an id
    pub fn has_unique_ids(&self) -> bool {
        let mut seen = HashSet::new();
        self.items.iter().all(|item| seen.insert(item.id))
    }

    /// New cart with `item` appended at the end
    pub fn with_appended(&self, item: LineItem) -> Self {
        let mut items = self.items.clone();
        items.push(item);
        Self { items }
    }

    /// New cart with the amount of `product_id` overwritten
    pub fn with_amount(&self, product_id: ProductId, amount: u32) -> Self {
        let items = self
            .items
            .iter()
            .map(|item| {
                if item.id == product_id {
                    item.with_amount(amount)
                } else {
                    item.clone()
                }
            })
            .collect();
        Self { items }
    }

    /// New cart without `product_id`
    pub fn without(&self, product_id: ProductId) -> Self {
        let items = self
            .items
            .iter()
            .filter(|item| item.id != product_id)
            .cloned()
            .collect();
        Self { items }
    }

    /// Sum of all amounts
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Sum of line totals; items without a readable price count as zero.
    /// Saturates instead of overflowing on extreme prices.
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .filter_map(LineItem::total_price)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }
}

impl From<Vec<LineItem>> for Cart {
    fn from(items: Vec<LineItem>) -> Self {
        Self::from_items(items)
    }
}
