//! Shopping carts: one active cart per user, lazily expired.

mod aggregate;
mod commands;
mod item;
mod lock;
mod service;
mod state;

pub use aggregate::{CART_TTL, Cart};
pub use commands::{AddCartItem, RemoveCartItem, UpdateCartItem};
pub use item::{CartItem, NewCartItem, PRICE_LOCK_DURATION};
pub use lock::{UserLockGuard, UserLocks};
pub use service::CartService;
pub use state::CartStatus;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The cart passed its expiration time.
    #[error("Cart {cart_id} expired at {expired_at}")]
    Expired {
        cart_id: String,
        expired_at: DateTime<Utc>,
    },

    #[error("Cart is {status} and cannot be modified")]
    NotActive { status: CartStatus },

    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i64 },

    /// The requested total exceeds what the catalog holds.
    #[error("Stock exceeded for {product_id}: requested {requested}, available {available}")]
    StockExceeded {
        product_id: String,
        requested: i64,
        available: i64,
    },

    #[error("Item not found in cart: {product_id}")]
    ItemNotFound { product_id: String },

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Product {product_id} is not in the cart")]
    ItemNotInCart { product_id: String },

    #[error("Cart is already empty")]
    AlreadyEmpty,

    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// Live stock no longer covers a line at checkout.
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },
}
