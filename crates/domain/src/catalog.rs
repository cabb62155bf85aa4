//! Product records as seen by the cart and checkout.

use serde::{Deserialize, Serialize};

use crate::value_objects::{Money, ProductId};

/// A catalog product with its live price and stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: i64,
}

impl Product {
    /// Creates a product record.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        stock: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            stock,
        }
    }

    /// Returns true if `quantity` units can be taken from stock.
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

/// Outcome of a conditional stock decrement.
///
/// The decrement only applies when the remaining stock covers the requested
/// quantity; it never drives stock negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    /// Stock was decremented.
    Applied { remaining: i64 },
    /// Stock was left untouched because it is lower than requested.
    Insufficient { available: i64 },
    /// The product does not exist.
    NotFound,
}

impl StockDecrement {
    /// Returns true if the decrement was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, StockDecrement::Applied { .. })
    }
}
