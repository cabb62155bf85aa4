//! In-memory store implementing every persistence port.
//!
//! Used by tests and by the API when no database is configured.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use common::{CartId, OrderId, TrackingId, UserId};

use crate::cart::{Cart, CartStatus};
use crate::catalog::{Product, StockDecrement};
use crate::error::StoreError;
use crate::order::Order;
use crate::repository::{
    CartRepository, OrderRepository, ProductCatalog, StoreResult, TrackingRepository,
};
use crate::tracking::{Tracking, TrackingStatus};
use crate::value_objects::ProductId;

#[derive(Debug, Default)]
struct MemoryState {
    products: HashMap<ProductId, Product>,
    carts: HashMap<CartId, Cart>,
    orders: HashMap<OrderId, Order>,
    trackings: HashMap<TrackingId, Tracking>,
    fail_on_order_create: bool,
    fail_on_tracking_create: bool,
    fail_on_cart_save: bool,
}

/// Thread-safe in-memory store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store preloaded with `products`.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let store = Self::new();
        for product in products {
            store.insert_product(product);
        }
        store
    }

    /// Inserts or replaces a product.
    pub fn insert_product(&self, product: Product) {
        self.write().products.insert(product.id.clone(), product);
    }

    /// Overwrites a product's stock. Unknown products are ignored.
    pub fn set_stock(&self, product_id: &ProductId, stock: i64) {
        if let Some(product) = self.write().products.get_mut(product_id) {
            product.stock = stock;
        }
    }

    pub fn product_stock(&self, product_id: &ProductId) -> Option<i64> {
        self.read().products.get(product_id).map(|p| p.stock)
    }

    /// Returns a cart by id regardless of its status.
    pub fn cart(&self, cart_id: CartId) -> Option<Cart> {
        self.read().carts.get(&cart_id).cloned()
    }

    pub fn order_count(&self) -> usize {
        self.read().orders.len()
    }

    pub fn tracking_count(&self) -> usize {
        self.read().trackings.len()
    }

    /// Makes subsequent order inserts fail with a backend error.
    pub fn set_fail_on_order_create(&self, fail: bool) {
        self.write().fail_on_order_create = fail;
    }

    /// Makes subsequent tracking inserts fail with a backend error.
    pub fn set_fail_on_tracking_create(&self, fail: bool) {
        self.write().fail_on_tracking_create = fail;
    }

    /// Makes subsequent cart writes fail with a backend error.
    pub fn set_fail_on_cart_save(&self, fail: bool) {
        self.write().fail_on_cart_save = fail;
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn simulated(operation: &str) -> StoreError {
    StoreError::backend(std::io::Error::other(format!(
        "simulated {operation} failure"
    )))
}

#[async_trait]
impl ProductCatalog for InMemoryStore {
    async fn find_product(&self, product_id: &ProductId) -> StoreResult<Option<Product>> {
        Ok(self.read().products.get(product_id).cloned())
    }

    async fn decrease_stock(
        &self,
        product_id: &ProductId,
        quantity: i64,
    ) -> StoreResult<StockDecrement> {
        let mut state = self.write();
        let Some(product) = state.products.get_mut(product_id) else {
            return Ok(StockDecrement::NotFound);
        };

        if product.stock < quantity {
            return Ok(StockDecrement::Insufficient {
                available: product.stock,
            });
        }
        product.stock -= quantity;
        Ok(StockDecrement::Applied {
            remaining: product.stock,
        })
    }

    async fn increase_stock(&self, product_id: &ProductId, quantity: i64) -> StoreResult<()> {
        let mut state = self.write();
        let product =
            state
                .products
                .get_mut(product_id)
                .ok_or_else(|| StoreError::NotFound {
                    entity: "Product",
                    id: product_id.to_string(),
                })?;
        product.stock += quantity;
        Ok(())
    }
}

#[async_trait]
impl CartRepository for InMemoryStore {
    async fn find_active_cart(&self, user_id: UserId) -> StoreResult<Option<Cart>> {
        Ok(self
            .read()
            .carts
            .values()
            .filter(|c| c.user_id() == user_id && c.status() == CartStatus::Active)
            .max_by_key(|c| c.updated_at())
            .cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> StoreResult<()> {
        let mut state = self.write();
        if state.fail_on_cart_save {
            return Err(simulated("cart save"));
        }
        state.carts.insert(cart.id(), cart.clone());
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn create_order(&self, order: &Order) -> StoreResult<Order> {
        let mut state = self.write();
        if state.fail_on_order_create {
            return Err(simulated("order create"));
        }
        if state.orders.contains_key(&order.id) {
            return Err(StoreError::Conflict(format!("order {} already exists", order.id)));
        }
        state.orders.insert(order.id, order.clone());
        Ok(order.clone())
    }

    async fn find_order(&self, order_id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.read().orders.get(&order_id).cloned())
    }

    async fn update_order(&self, order: &Order) -> StoreResult<()> {
        let mut state = self.write();
        let stored = state
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "Order",
                id: order.id.to_string(),
            })?;
        *stored = order.clone();
        Ok(())
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .read()
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

#[async_trait]
impl TrackingRepository for InMemoryStore {
    async fn create_tracking(&self, tracking: &Tracking) -> StoreResult<()> {
        let mut state = self.write();
        if state.fail_on_tracking_create {
            return Err(simulated("tracking create"));
        }
        if let Some(existing) = state.trackings.values().find(|t| {
            t.tracking_number == tracking.tracking_number || t.order_id == tracking.order_id
        }) {
            return Err(StoreError::Conflict(format!(
                "tracking {} conflicts with {}",
                tracking.tracking_number, existing.tracking_number
            )));
        }
        state.trackings.insert(tracking.id, tracking.clone());
        Ok(())
    }

    async fn find_tracking(&self, tracking_id: TrackingId) -> StoreResult<Option<Tracking>> {
        Ok(self.read().trackings.get(&tracking_id).cloned())
    }

    async fn find_tracking_by_order(&self, order_id: OrderId) -> StoreResult<Option<Tracking>> {
        Ok(self
            .read()
            .trackings
            .values()
            .find(|t| t.order_id == order_id)
            .cloned())
    }

    async fn find_tracking_by_number(
        &self,
        tracking_number: &str,
    ) -> StoreResult<Option<Tracking>> {
        Ok(self
            .read()
            .trackings
            .values()
            .find(|t| t.tracking_number == tracking_number)
            .cloned())
    }

    async fn update_tracking(&self, tracking: &Tracking) -> StoreResult<()> {
        let mut state = self.write();
        if state
            .trackings
            .values()
            .any(|t| t.id != tracking.id && t.tracking_number == tracking.tracking_number)
        {
            return Err(StoreError::Conflict(format!(
                "tracking number {} already in use",
                tracking.tracking_number
            )));
        }
        let stored = state
            .trackings
            .get_mut(&tracking.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "Tracking",
                id: tracking.id.to_string(),
            })?;
        *stored = tracking.clone();
        Ok(())
    }

    async fn delete_tracking(&self, tracking_id: TrackingId) -> StoreResult<bool> {
        Ok(self.write().trackings.remove(&tracking_id).is_some())
    }

    async fn list_active_trackings(&self) -> StoreResult<Vec<Tracking>> {
        let mut trackings: Vec<Tracking> = self
            .read()
            .trackings
            .values()
            .filter(|t| t.is_active)
            .cloned()
            .collect();
        trackings.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(trackings)
    }

    async fn list_trackings_by_status(
        &self,
        status: TrackingStatus,
    ) -> StoreResult<Vec<Tracking>> {
        let mut trackings: Vec<Tracking> = self
            .read()
            .trackings
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect();
        trackings.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(trackings)
    }
}
