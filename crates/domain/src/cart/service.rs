//! Cart service providing the cart lifecycle operations.

use chrono::{DateTime, Utc};
use common::UserId;

use crate::catalog::Product;
use crate::error::DomainError;
use crate::order::OrderDetails;
use crate::repository::Store;
use crate::value_objects::ProductId;

use super::{
    AddCartItem, Cart, CartError, NewCartItem, RemoveCartItem, UpdateCartItem, UserLockGuard,
    UserLocks,
};

/// Service for managing carts.
///
/// Every operation runs under the owning user's lock, so concurrent requests
/// for one user never interleave.
pub struct CartService<S: Store> {
    store: S,
    locks: UserLocks,
}

impl<S: Store> CartService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: UserLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Takes the user's cart lock. Checkout holds it across its whole unit of
    /// work.
    pub async fn lock_user(&self, user_id: UserId) -> UserLockGuard {
        self.locks.lock(user_id).await
    }

    /// Returns the user's active cart, creating an empty one if none exists.
    ///
    /// An overdue cart is persisted as expired and reported as such; the next
    /// call starts a fresh cart.
    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self, user_id: UserId) -> Result<Cart, DomainError> {
        let guard = self.lock_user(user_id).await;
        self.load_active(&guard, Utc::now()).await
    }

    /// Adds a product at its current catalog price.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(&self, cmd: AddCartItem) -> Result<Cart, DomainError> {
        let guard = self.lock_user(cmd.user_id).await;
        let now = Utc::now();
        let mut cart = self.load_active(&guard, now).await?;
        let product = self.find_product(&cmd.product_id).await?;

        cart.add_item(
            NewCartItem::from_product(&product, cmd.quantity),
            product.stock,
            now,
        )?;
        self.save(&cart, "add_item").await?;
        Ok(cart)
    }

    /// Overwrites the quantity of a line already in the cart.
    #[tracing::instrument(skip(self))]
    pub async fn update_quantity(&self, cmd: UpdateCartItem) -> Result<Cart, DomainError> {
        let guard = self.lock_user(cmd.user_id).await;
        let now = Utc::now();
        let mut cart = self.load_active(&guard, now).await?;

        if cart.item(&cmd.product_id).is_none() {
            return Err(CartError::ItemNotFound {
                product_id: cmd.product_id.to_string(),
            }
            .into());
        }
        let product = self.find_product(&cmd.product_id).await?;

        cart.update_quantity(&cmd.product_id, cmd.quantity, product.stock, now)?;
        self.save(&cart, "update_quantity").await?;
        Ok(cart)
    }

    /// Removes a line from a non-empty cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, cmd: RemoveCartItem) -> Result<Cart, DomainError> {
        let guard = self.lock_user(cmd.user_id).await;
        let now = Utc::now();
        let mut cart = self.load_active(&guard, now).await?;

        if cart.is_empty() {
            return Err(CartError::EmptyCart.into());
        }
        if cart.item(&cmd.product_id).is_none() {
            return Err(CartError::ItemNotInCart {
                product_id: cmd.product_id.to_string(),
            }
            .into());
        }

        cart.remove_item(&cmd.product_id, now)?;
        self.save(&cart, "remove_item").await?;
        Ok(cart)
    }

    /// Empties a non-empty cart.
    #[tracing::instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: UserId) -> Result<Cart, DomainError> {
        let guard = self.lock_user(user_id).await;
        let now = Utc::now();
        let mut cart = self.load_active(&guard, now).await?;

        if cart.is_empty() {
            return Err(CartError::AlreadyEmpty.into());
        }

        cart.clear(now)?;
        self.save(&cart, "clear").await?;
        Ok(cart)
    }

    /// Loads the cart for checkout, checks the order details, then checks
    /// every line against the live catalog. Nothing is written.
    #[tracing::instrument(skip(self, guard, details), fields(user_id = %guard.user_id()))]
    pub async fn prepare_checkout(
        &self,
        guard: &UserLockGuard,
        details: &OrderDetails,
    ) -> Result<Cart, DomainError> {
        let cart = self.load_active(guard, Utc::now()).await?;

        if cart.is_empty() {
            return Err(CartError::EmptyCart.into());
        }
        details.validate()?;

        for item in cart.items() {
            let product = self
                .store
                .find_product(&item.product_id)
                .await?
                .ok_or_else(|| CartError::ProductNotFound {
                    product_id: item.product_id.to_string(),
                })?;

            if !product.has_stock_for(item.quantity) {
                return Err(CartError::InsufficientStock {
                    product_id: item.product_id.to_string(),
                    requested: item.quantity,
                    available: product.stock,
                }
                .into());
            }
        }

        Ok(cart)
    }

    /// Empties the cart and marks it checked out.
    #[tracing::instrument(skip(self, guard, cart), fields(cart_id = %cart.id()))]
    pub async fn complete_checkout(
        &self,
        guard: &UserLockGuard,
        cart: &mut Cart,
    ) -> Result<(), DomainError> {
        debug_assert_eq!(guard.user_id(), cart.user_id());
        cart.mark_checked_out(Utc::now())?;
        self.save(cart, "checkout").await
    }

    /// Writes back a cart snapshot taken before checkout.
    #[tracing::instrument(skip(self, guard, snapshot), fields(cart_id = %snapshot.id()))]
    pub async fn restore_cart(
        &self,
        guard: &UserLockGuard,
        snapshot: &Cart,
    ) -> Result<(), DomainError> {
        debug_assert_eq!(guard.user_id(), snapshot.user_id());
        self.store.save_cart(snapshot).await?;
        tracing::info!("cart restored");
        Ok(())
    }

    async fn load_active(
        &self,
        guard: &UserLockGuard,
        now: DateTime<Utc>,
    ) -> Result<Cart, DomainError> {
        let user_id = guard.user_id();

        match self.store.find_active_cart(user_id).await? {
            Some(mut cart) => {
                if let Err(e) = cart.check_expiration(now) {
                    self.store.save_cart(&cart).await?;
                    tracing::info!(cart_id = %cart.id(), "cart expired");
                    return Err(e.into());
                }
                Ok(cart)
            }
            None => {
                let cart = Cart::new(user_id, now);
                self.store.save_cart(&cart).await?;
                tracing::info!(cart_id = %cart.id(), %user_id, "cart created");
                Ok(cart)
            }
        }
    }

    async fn find_product(&self, product_id: &ProductId) -> Result<Product, DomainError> {
        self.store
            .find_product(product_id)
            .await?
            .ok_or_else(|| {
                CartError::ProductNotFound {
                    product_id: product_id.to_string(),
                }
                .into()
            })
    }

    async fn save(&self, cart: &Cart, operation: &'static str) -> Result<(), DomainError> {
        self.store.save_cart(cart).await?;
        metrics::counter!("cart_operations_total", "operation" => operation).increment(1);
        tracing::debug!(
            cart_id = %cart.id(),
            items = cart.item_count(),
            total = %cart.total_amount(),
            operation,
            "cart saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{CART_TTL, CartStatus};
    use crate::memory::InMemoryStore;
    use crate::order::OrderError;
    use crate::repository::CartRepository;
    use crate::value_objects::Money;

    fn details() -> OrderDetails {
        OrderDetails::new("Main St 1", "card")
    }

    fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert_product(Product::new("SKU-001", "Widget", Money::from_units(100), 5));
        store.insert_product(Product::new("SKU-002", "Gadget", Money::from_cents(2550), 2));
        store
    }

    #[tokio::test]
    async fn test_get_cart_creates_empty_cart_once() {
        let service = CartService::new(store());
        let user = UserId::new();

        let first = service.get_cart(user).await.unwrap();
        let second = service.get_cart(user).await.unwrap();

        assert!(first.is_empty());
        assert_eq!(first.status(), CartStatus::Active);
        assert_eq!(first.id(), second.id());
    }

    #[tokio::test]
    async fn test_add_and_merge_items() {
        let service = CartService::new(store());
        let user = UserId::new();

        service
            .add_item(AddCartItem::new(user, "SKU-001", 2))
            .await
            .unwrap();
        let cart = service
            .add_item(AddCartItem::new(user, "SKU-001", 3))
            .await
            .unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.total_amount(), Money::from_units(500));
    }

    #[tokio::test]
    async fn test_add_beyond_stock_fails() {
        let service = CartService::new(store());
        let user = UserId::new();

        let err = service
            .add_item(AddCartItem::new(user, "SKU-002", 3))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Cart(CartError::StockExceeded {
                requested: 3,
                available: 2,
                ..
            })
        ));
        assert!(service.get_cart(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_unknown_product() {
        let service = CartService::new(store());
        let err = service
            .add_item(AddCartItem::new(UserId::new(), "SKU-404", 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Cart(CartError::ProductNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_quantity_requires_line() {
        let service = CartService::new(store());
        let user = UserId::new();

        let err = service
            .update_quantity(UpdateCartItem::new(user, "SKU-001", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Cart(CartError::ItemNotFound { .. })));

        service
            .add_item(AddCartItem::new(user, "SKU-001", 1))
            .await
            .unwrap();
        let cart = service
            .update_quantity(UpdateCartItem::new(user, "SKU-001", 4))
            .await
            .unwrap();
        assert_eq!(cart.total_amount(), Money::from_units(400));
    }

    #[tokio::test]
    async fn test_remove_item_guards() {
        let service = CartService::new(store());
        let user = UserId::new();

        assert!(matches!(
            service
                .remove_item(RemoveCartItem::new(user, "SKU-001"))
                .await,
            Err(DomainError::Cart(CartError::EmptyCart))
        ));

        service
            .add_item(AddCartItem::new(user, "SKU-001", 1))
            .await
            .unwrap();
        assert!(matches!(
            service
                .remove_item(RemoveCartItem::new(user, "SKU-002"))
                .await,
            Err(DomainError::Cart(CartError::ItemNotInCart { .. }))
        ));

        let cart = service
            .remove_item(RemoveCartItem::new(user, "SKU-001"))
            .await
            .unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_amount(), Money::zero());
    }

    #[tokio::test]
    async fn test_clear_cart() {
        let service = CartService::new(store());
        let user = UserId::new();

        assert!(matches!(
            service.clear_cart(user).await,
            Err(DomainError::Cart(CartError::AlreadyEmpty))
        ));

        service
            .add_item(AddCartItem::new(user, "SKU-001", 1))
            .await
            .unwrap();
        assert!(service.clear_cart(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_cart_is_persisted_then_replaced() {
        let store = store();
        let service = CartService::new(store.clone());
        let user = UserId::new();
        let stale = Cart::new(user, Utc::now() - CART_TTL * 2);
        store.save_cart(&stale).await.unwrap();

        let err = service.get_cart(user).await.unwrap_err();
        assert!(matches!(err, DomainError::Cart(CartError::Expired { .. })));
        assert_eq!(
            store.cart(stale.id()).unwrap().status(),
            CartStatus::Expired
        );

        let fresh = service.get_cart(user).await.unwrap();
        assert_ne!(fresh.id(), stale.id());
        assert_eq!(fresh.status(), CartStatus::Active);
    }

    #[tokio::test]
    async fn test_prepare_checkout_checks_live_stock() {
        let store = store();
        let service = CartService::new(store.clone());
        let user = UserId::new();
        service
            .add_item(AddCartItem::new(user, "SKU-002", 2))
            .await
            .unwrap();
        store.set_stock(&ProductId::new("SKU-002"), 1);

        let guard = service.lock_user(user).await;
        assert!(matches!(
            service.prepare_checkout(&guard, &details()).await,
            Err(DomainError::Cart(CartError::InsufficientStock {
                requested: 2,
                available: 1,
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_prepare_checkout_checks_details_before_stock() {
        let store = store();
        let service = CartService::new(store.clone());
        let user = UserId::new();
        service
            .add_item(AddCartItem::new(user, "SKU-002", 2))
            .await
            .unwrap();
        store.set_stock(&ProductId::new("SKU-002"), 1);

        let guard = service.lock_user(user).await;
        assert!(matches!(
            service
                .prepare_checkout(&guard, &OrderDetails::new("", ""))
                .await,
            Err(DomainError::Order(OrderError::ShippingAddressRequired))
        ));
        assert!(matches!(
            service
                .prepare_checkout(&guard, &OrderDetails::new("Main St 1", " "))
                .await,
            Err(DomainError::Order(OrderError::PaymentMethodRequired))
        ));
    }

    #[tokio::test]
    async fn test_prepare_checkout_rejects_empty_cart() {
        let service = CartService::new(store());
        let guard = service.lock_user(UserId::new()).await;
        assert!(matches!(
            service.prepare_checkout(&guard, &details()).await,
            Err(DomainError::Cart(CartError::EmptyCart))
        ));
    }

    #[tokio::test]
    async fn test_complete_and_restore_checkout() {
        let store = store();
        let service = CartService::new(store.clone());
        let user = UserId::new();
        service
            .add_item(AddCartItem::new(user, "SKU-001", 2))
            .await
            .unwrap();

        let guard = service.lock_user(user).await;
        let mut cart = service.prepare_checkout(&guard, &details()).await.unwrap();
        let snapshot = cart.clone();
        service.complete_checkout(&guard, &mut cart).await.unwrap();
        assert_eq!(cart.status(), CartStatus::CheckedOut);
        assert!(store.find_active_cart(user).await.unwrap().is_none());

        service.restore_cart(&guard, &snapshot).await.unwrap();
        drop(guard);
        let restored = service.get_cart(user).await.unwrap();
        assert_eq!(restored, snapshot);
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_serialized() {
        let service = std::sync::Arc::new(CartService::new(store()));
        let user = UserId::new();

        let tasks: Vec<_> = (0..5)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .add_item(AddCartItem::new(user, "SKU-001", 1))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let cart = service.get_cart(user).await.unwrap();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }
}
