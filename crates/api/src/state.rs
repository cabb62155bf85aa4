//! Shared application state.

use std::sync::Arc;

use checkout::CheckoutCoordinator;
use domain::{
    BroadcastNotifier, CartService, OrderService, ShippingPolicy, Store, TrackingService,
};

/// Services shared by every handler.
///
/// The cart service is shared with the checkout coordinator so both take the
/// same per-user locks.
pub struct AppState<S: Store> {
    pub carts: Arc<CartService<S>>,
    pub orders: OrderService<S>,
    pub trackings: TrackingService<S, BroadcastNotifier>,
    pub checkout: CheckoutCoordinator<S, BroadcastNotifier>,
    pub notifier: BroadcastNotifier,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S, notifier: BroadcastNotifier, policy: ShippingPolicy) -> Self {
        let carts = Arc::new(CartService::new(store.clone()));
        let checkout = CheckoutCoordinator::new(store.clone(), carts.clone(), notifier.clone())
            .with_policy(policy);

        Self {
            orders: OrderService::new(store.clone()),
            trackings: TrackingService::new(store, notifier.clone()),
            carts,
            checkout,
            notifier,
        }
    }
}
