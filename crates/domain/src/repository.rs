//! Persistence ports the services depend on.
//!
//! Each port is implemented by [`crate::memory::InMemoryStore`] and by the
//! PostgreSQL adapter in the `store` crate. Method names are unique across
//! ports so that a single store type can implement all of them.

use async_trait::async_trait;
use common::{OrderId, TrackingId, UserId};

use crate::cart::Cart;
use crate::catalog::{Product, StockDecrement};
use crate::error::StoreError;
use crate::order::Order;
use crate::tracking::{Tracking, TrackingStatus};
use crate::value_objects::ProductId;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Read access to products plus the one shared mutable counter: stock.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Looks up a product.
    async fn find_product(&self, product_id: &ProductId) -> StoreResult<Option<Product>>;

    /// Atomically decrements stock if, and only if, it covers `quantity`.
    async fn decrease_stock(
        &self,
        product_id: &ProductId,
        quantity: i64,
    ) -> StoreResult<StockDecrement>;

    /// Returns previously decremented stock.
    async fn increase_stock(&self, product_id: &ProductId, quantity: i64) -> StoreResult<()>;
}

/// Cart persistence.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Returns the user's cart with status `active`, if any.
    async fn find_active_cart(&self, user_id: UserId) -> StoreResult<Option<Cart>>;

    /// Inserts or replaces a cart.
    async fn save_cart(&self, cart: &Cart) -> StoreResult<()>;
}

/// Order persistence. Orders are never deleted.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists a new order together with its lines.
    async fn create_order(&self, order: &Order) -> StoreResult<Order>;

    async fn find_order(&self, order_id: OrderId) -> StoreResult<Option<Order>>;

    /// Replaces the mutable part of an order (status, cancellation, tracking).
    async fn update_order(&self, order: &Order) -> StoreResult<()>;

    /// Lists a user's orders, newest first.
    async fn list_orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>>;
}

/// Tracking persistence.
#[async_trait]
pub trait TrackingRepository: Send + Sync {
    /// Persists a new tracking. Fails with `Conflict` on a duplicate tracking
    /// number or a second tracking for the same order.
    async fn create_tracking(&self, tracking: &Tracking) -> StoreResult<()>;

    async fn find_tracking(&self, tracking_id: TrackingId) -> StoreResult<Option<Tracking>>;

    async fn find_tracking_by_order(&self, order_id: OrderId) -> StoreResult<Option<Tracking>>;

    async fn find_tracking_by_number(&self, tracking_number: &str)
    -> StoreResult<Option<Tracking>>;

    async fn update_tracking(&self, tracking: &Tracking) -> StoreResult<()>;

    /// Deletes a tracking, returning false if it did not exist.
    async fn delete_tracking(&self, tracking_id: TrackingId) -> StoreResult<bool>;

    async fn list_active_trackings(&self) -> StoreResult<Vec<Tracking>>;

    async fn list_trackings_by_status(&self, status: TrackingStatus)
    -> StoreResult<Vec<Tracking>>;
}

/// Everything the services need from a single backing store.
pub trait Store:
    ProductCatalog + CartRepository + OrderRepository + TrackingRepository + Clone + 'static
{
}

impl<T> Store for T where
    T: ProductCatalog + CartRepository + OrderRepository + TrackingRepository + Clone + 'static
{
}
