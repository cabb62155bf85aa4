//! Cart line items.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::value_objects::{Money, ProductId};

/// How long the price captured at add time is honored.
pub const PRICE_LOCK_DURATION: Duration = Duration::hours(2);

/// An item requested for the cart, priced from the catalog at add time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: i64,
}

impl NewCartItem {
    /// Creates a new cart item request.
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        quantity: i64,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            price,
            quantity,
        }
    }

    /// Captures the product's current name and price.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        Self::new(product.id.clone(), product.name.clone(), product.price, quantity)
    }
}

/// A line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    /// Unit price captured when the line was first added.
    pub price: Money,
    pub quantity: i64,
    /// Stock reported by the catalog at the last add/update.
    pub stock_available: i64,
    pub subtotal: Money,
    pub added_at: DateTime<Utc>,
    pub price_locked_until: DateTime<Utc>,
}

impl CartItem {
    pub(crate) fn new(item: NewCartItem, stock_available: i64, now: DateTime<Utc>) -> Self {
        Self {
            subtotal: item.price.multiply(item.quantity),
            product_id: item.product_id,
            name: item.name,
            price: item.price,
            quantity: item.quantity,
            stock_available,
            added_at: now,
            price_locked_until: now + PRICE_LOCK_DURATION,
        }
    }

    pub(crate) fn set_quantity(&mut self, quantity: i64, stock_available: i64) {
        self.quantity = quantity;
        self.stock_available = stock_available;
        self.subtotal = self.price.multiply(quantity);
    }

    /// Returns true while the captured price is still honored.
    pub fn is_price_locked(&self, now: DateTime<Utc>) -> bool {
        now <= self.price_locked_until
    }
}
