//! Integration tests for carts, orders and shipments over the in-memory store.
//!
//! These tests drive the services the way the HTTP layer does and check the
//! state left in the store.

use chrono::Utc;
use common::UserId;
use domain::{
    AddCartItem, AssignTracking, CancelOrder, CartError, CartService, CartStatus, DomainError,
    InMemoryStore, Money, Notification, Order, OrderDetails, OrderLine, OrderRepository,
    OrderService, OrderStatus, Product, RecordingNotifier, RemoveCartItem, ShippingPolicy,
    TrackingAssignment, TrackingError, TrackingService, TrackingStatus, TrackingStatusUpdate,
    UpdateCartItem,
};

fn seeded_store() -> InMemoryStore {
    InMemoryStore::with_products([
        Product::new("SKU-001", "Widget", Money::from_units(100), 10),
        Product::new("SKU-002", "Gadget", Money::from_units(25), 3),
    ])
}

async fn place_order(store: &InMemoryStore) -> Order {
    let order = Order::place(
        UserId::new(),
        vec![OrderLine::new("SKU-001", "Widget", Money::from_units(100), 1)],
        OrderDetails::new("Main St 1", "card"),
        &ShippingPolicy::default(),
        Utc::now(),
    );
    store.create_order(&order).await.unwrap()
}

mod cart_lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_totals_follow_every_mutation() {
        let service = CartService::new(seeded_store());
        let user = UserId::new();

        let cart = service
            .add_item(AddCartItem::new(user, "SKU-001", 2))
            .await
            .unwrap();
        assert_eq!(cart.total_amount(), Money::from_units(200));

        let cart = service
            .add_item(AddCartItem::new(user, "SKU-002", 3))
            .await
            .unwrap();
        assert_eq!(cart.total_amount(), Money::from_units(275));

        let cart = service
            .update_quantity(UpdateCartItem::new(user, "SKU-001", 1))
            .await
            .unwrap();
        assert_eq!(cart.total_amount(), Money::from_units(175));

        let cart = service
            .remove_item(RemoveCartItem::new(user, "SKU-002"))
            .await
            .unwrap();
        assert_eq!(cart.total_amount(), Money::from_units(100));
        assert_eq!(cart.item_count(), 1);

        let cart = service.clear_cart(user).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_amount(), Money::zero());
        assert_eq!(cart.status(), CartStatus::Active);
    }

    #[tokio::test]
    async fn test_quantity_is_never_clamped() {
        let service = CartService::new(seeded_store());
        let user = UserId::new();
        service
            .add_item(AddCartItem::new(user, "SKU-002", 2))
            .await
            .unwrap();

        let err = service
            .add_item(AddCartItem::new(user, "SKU-002", 2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Cart(CartError::StockExceeded {
                requested: 4,
                available: 3,
                ..
            })
        ));

        let cart = service.get_cart(user).await.unwrap();
        assert_eq!(cart.total_quantity(), 2);
    }

    #[tokio::test]
    async fn test_carts_are_isolated_per_user() {
        let service = CartService::new(seeded_store());
        let alice = UserId::new();
        let bob = UserId::new();

        service
            .add_item(AddCartItem::new(alice, "SKU-001", 1))
            .await
            .unwrap();

        assert!(service.get_cart(bob).await.unwrap().is_empty());
        assert_eq!(service.get_cart(alice).await.unwrap().item_count(), 1);
    }
}

mod shipment_lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_order_follows_its_shipment_to_delivery() {
        let store = seeded_store();
        let trackings = TrackingService::new(store.clone(), RecordingNotifier::new());
        let orders = OrderService::new(store.clone());
        let order = place_order(&store).await;
        let tracking = trackings.initialize_for_order(&order).await.unwrap();

        let (order, tracking) = orders
            .assign_tracking(AssignTracking::new(
                order.id,
                TrackingAssignment::new(tracking.tracking_number.clone(), "ACME"),
            ))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::InTransit);

        for (status, location) in [
            (TrackingStatus::InTransit, "Hub A"),
            (TrackingStatus::OutForDelivery, "Downtown"),
            (TrackingStatus::Delivered, "Front door"),
        ] {
            trackings
                .update_status(tracking.id, TrackingStatusUpdate::new(status).at(location))
                .await
                .unwrap();
        }

        let order = orders.get_order(order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);

        let tracking = trackings.get(tracking.id).await.unwrap();
        assert!(tracking.actual_delivery_date.is_some());
        assert_eq!(tracking.current_location.as_deref(), Some("Front door"));

        let published = trackings.notifier().published().await;
        assert_eq!(published.len(), 3);
        assert!(
            published
                .iter()
                .all(|n| matches!(n, Notification::TrackingUpdated(_)))
        );
    }

    #[tokio::test]
    async fn test_skipping_a_step_is_rejected() {
        let store = seeded_store();
        let trackings = TrackingService::new(store.clone(), RecordingNotifier::new());
        let order = place_order(&store).await;
        let tracking = trackings.initialize_for_order(&order).await.unwrap();

        trackings
            .update_status(
                tracking.id,
                TrackingStatusUpdate::new(TrackingStatus::InTransit),
            )
            .await
            .unwrap();
        let err = trackings
            .update_status(
                tracking.id,
                TrackingStatusUpdate::new(TrackingStatus::Delivered),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::Tracking(TrackingError::InvalidTransition {
                from: TrackingStatus::InTransit,
                to: TrackingStatus::Delivered,
            })
        ));
    }

    #[tokio::test]
    async fn test_cancelled_order_cannot_ship() {
        let store = seeded_store();
        let orders = OrderService::new(store.clone());
        let order = place_order(&store).await;

        orders
            .cancel_order(CancelOrder::new(order.id, "customer request"))
            .await
            .unwrap();
        let order = orders.get_order(order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.cancellation_reason.as_deref(), Some("customer request"));

        assert!(
            orders
                .assign_tracking(AssignTracking::new(
                    order.id,
                    TrackingAssignment::new("TRK-X", "ACME"),
                ))
                .await
                .is_err()
        );
    }
}
