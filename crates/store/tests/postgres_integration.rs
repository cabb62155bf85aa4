//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container and truncate every table
//! before each test, so they run serially.
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::Arc;

use chrono::Utc;
use common::{OrderId, UserId};
use domain::{
    AddCartItem, Cart, CartRepository, CartService, CartStatus, Money, Order, OrderDetails,
    OrderLine, OrderRepository, OrderStatus, Product, ProductCatalog, ProductId,
    ShippingPolicy, StockDecrement, StoreError, Tracking, TrackingRepository, TrackingStatus,
};
use serial_test::serial;
use sqlx::PgPool;
use store::PostgresStore;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_commerce_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Fresh store with its own pool, empty tables and two products.
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE trackings, order_lines, orders, carts, products")
        .execute(&pool)
        .await
        .unwrap();

    let store = PostgresStore::new(pool);
    store
        .upsert_product(&Product::new("SKU-001", "Widget", Money::from_units(100), 5))
        .await
        .unwrap();
    store
        .upsert_product(&Product::new("SKU-002", "Gadget", Money::from_cents(2550), 1))
        .await
        .unwrap();
    store
}

fn sku(id: &str) -> ProductId {
    ProductId::new(id)
}

fn new_order(user_id: UserId) -> Order {
    Order::place(
        user_id,
        vec![
            OrderLine::new("SKU-001", "Widget", Money::from_units(100), 2),
            OrderLine::new("SKU-002", "Gadget", Money::from_cents(2550), 1),
        ],
        OrderDetails::new("Main St 1", "card"),
        &ShippingPolicy::default(),
        Utc::now(),
    )
}

#[tokio::test]
#[serial]
async fn test_conditional_stock_decrement() {
    let store = get_test_store().await;

    assert_eq!(
        store.decrease_stock(&sku("SKU-001"), 3).await.unwrap(),
        StockDecrement::Applied { remaining: 2 }
    );
    assert_eq!(
        store.decrease_stock(&sku("SKU-001"), 3).await.unwrap(),
        StockDecrement::Insufficient { available: 2 }
    );
    assert_eq!(
        store.decrease_stock(&sku("SKU-404"), 1).await.unwrap(),
        StockDecrement::NotFound
    );

    store.increase_stock(&sku("SKU-001"), 3).await.unwrap();
    let product = store.find_product(&sku("SKU-001")).await.unwrap().unwrap();
    assert_eq!(product.stock, 5);
    assert_eq!(product.price, Money::from_units(100));
}

#[tokio::test]
#[serial]
async fn test_concurrent_decrements_never_oversell() {
    let store = get_test_store().await;

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.decrease_stock(&sku("SKU-002"), 1).await.unwrap() })
        })
        .collect();

    let mut applied = 0;
    for task in tasks {
        if task.await.unwrap().is_applied() {
            applied += 1;
        }
    }

    assert_eq!(applied, 1);
    let product = store.find_product(&sku("SKU-002")).await.unwrap().unwrap();
    assert_eq!(product.stock, 0);
}

#[tokio::test]
#[serial]
async fn test_increase_stock_of_missing_product_fails() {
    let store = get_test_store().await;
    assert!(matches!(
        store.increase_stock(&sku("SKU-404"), 1).await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
#[serial]
async fn test_cart_round_trip_through_service() {
    let store = get_test_store().await;
    let service = CartService::new(store.clone());
    let user = UserId::new();

    let cart = service
        .add_item(AddCartItem::new(user, "SKU-001", 2))
        .await
        .unwrap();

    let stored = store.find_active_cart(user).await.unwrap().unwrap();
    assert_eq!(stored, cart);
    assert_eq!(stored.total_amount(), Money::from_units(200));
}

#[tokio::test]
#[serial]
async fn test_only_one_active_cart_per_user() {
    let store = get_test_store().await;
    let user = UserId::new();

    store.save_cart(&Cart::new(user, Utc::now())).await.unwrap();
    let err = store
        .save_cart(&Cart::new(user, Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[tokio::test]
#[serial]
async fn test_checked_out_cart_is_no_longer_active() {
    let store = get_test_store().await;
    let user = UserId::new();
    let mut cart = Cart::new(user, Utc::now());
    store.save_cart(&cart).await.unwrap();

    cart.mark_checked_out(Utc::now()).unwrap();
    store.save_cart(&cart).await.unwrap();

    assert!(store.find_active_cart(user).await.unwrap().is_none());
    let fresh = Cart::new(user, Utc::now());
    store.save_cart(&fresh).await.unwrap();
    assert_eq!(
        store.find_active_cart(user).await.unwrap().unwrap().status(),
        CartStatus::Active
    );
}

#[tokio::test]
#[serial]
async fn test_order_round_trip_keeps_lines_in_order() {
    let store = get_test_store().await;
    let user = UserId::new();
    let order = store.create_order(&new_order(user)).await.unwrap();

    let loaded = store.find_order(order.id).await.unwrap().unwrap();
    assert_eq!(loaded.order_number, order.order_number);
    assert_eq!(loaded.lines, order.lines);
    assert_eq!(loaded.subtotal, Money::from_cents(22_550));
    assert_eq!(loaded.total_amount, order.total_amount);
    assert_eq!(loaded.status, OrderStatus::Pending);

    assert!(store.find_order(OrderId::new()).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn test_order_updates_and_listing() {
    let store = get_test_store().await;
    let user = UserId::new();
    let first = store.create_order(&new_order(user)).await.unwrap();
    let second = store.create_order(&new_order(user)).await.unwrap();
    store.create_order(&new_order(UserId::new())).await.unwrap();

    let mut cancelled = first.clone();
    cancelled.cancel("customer request", Utc::now()).unwrap();
    store.update_order(&cancelled).await.unwrap();

    let listed = store.list_orders_for_user(user).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].status, OrderStatus::Cancelled);
    assert_eq!(listed[1].cancellation_reason.as_deref(), Some("customer request"));
    assert_eq!(listed[0].lines.len(), 2);

    let mut missing = new_order(user);
    missing.status = OrderStatus::Cancelled;
    assert!(matches!(
        store.update_order(&missing).await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
#[serial]
async fn test_tracking_round_trip_and_queries() {
    let store = get_test_store().await;
    let order = store.create_order(&new_order(UserId::new())).await.unwrap();
    let mut tracking = Tracking::new(order.id, "TRK123456789", Utc::now());
    tracking.carrier_name = Some("ACME".to_string());
    store.create_tracking(&tracking).await.unwrap();

    let by_id = store.find_tracking(tracking.id).await.unwrap().unwrap();
    assert_eq!(by_id.tracking_number, "TRK123456789");
    assert_eq!(by_id.carrier_name.as_deref(), Some("ACME"));
    assert_eq!(
        store
            .find_tracking_by_order(order.id)
            .await
            .unwrap()
            .unwrap()
            .id,
        tracking.id
    );
    assert_eq!(
        store
            .find_tracking_by_number("TRK123456789")
            .await
            .unwrap()
            .unwrap()
            .id,
        tracking.id
    );

    tracking.status = TrackingStatus::InTransit;
    tracking.current_location = Some("Hub A".to_string());
    store.update_tracking(&tracking).await.unwrap();

    let in_transit = store
        .list_trackings_by_status(TrackingStatus::InTransit)
        .await
        .unwrap();
    assert_eq!(in_transit.len(), 1);
    assert_eq!(in_transit[0].current_location.as_deref(), Some("Hub A"));
    assert!(
        store
            .list_trackings_by_status(TrackingStatus::Pending)
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(store.list_active_trackings().await.unwrap().len(), 1);

    assert!(store.delete_tracking(tracking.id).await.unwrap());
    assert!(!store.delete_tracking(tracking.id).await.unwrap());
}

#[tokio::test]
#[serial]
async fn test_tracking_numbers_and_orders_are_unique() {
    let store = get_test_store().await;
    let first = store.create_order(&new_order(UserId::new())).await.unwrap();
    let second = store.create_order(&new_order(UserId::new())).await.unwrap();

    store
        .create_tracking(&Tracking::new(first.id, "TRK000000001", Utc::now()))
        .await
        .unwrap();

    assert!(matches!(
        store
            .create_tracking(&Tracking::new(second.id, "TRK000000001", Utc::now()))
            .await,
        Err(StoreError::Conflict(_))
    ));
    assert!(matches!(
        store
            .create_tracking(&Tracking::new(first.id, "TRK000000002", Utc::now()))
            .await,
        Err(StoreError::Conflict(_))
    ));
}
