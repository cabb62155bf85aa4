//! HTTP API server for the cart, checkout and shipment tracking backend.
//!
//! Provides REST endpoints over the domain services, with structured logging
//! (tracing) and Prometheus metrics.

pub mod boolean;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use domain::{BroadcastNotifier, InMemoryStore, Money, Product, ShippingPolicy, Store};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/users/{user_id}/cart",
            get(routes::carts::get::<S>).delete(routes::carts::clear::<S>),
        )
        .route("/users/{user_id}/cart/items", post(routes::carts::add_item::<S>))
        .route(
            "/users/{user_id}/cart/items/{product_id}",
            put(routes::carts::update_item::<S>).delete(routes::carts::remove_item::<S>),
        )
        .route(
            "/users/{user_id}/cart/checkout",
            post(routes::carts::checkout::<S>),
        )
        .route(
            "/users/{user_id}/orders",
            get(routes::orders::list_for_user::<S>),
        )
        .route("/checkout", post(routes::checkout::create::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route(
            "/orders/{id}/tracking",
            get(routes::orders::tracking::<S>).post(routes::orders::assign_tracking::<S>),
        )
        .route("/trackings", get(routes::trackings::list::<S>))
        .route(
            "/trackings/number/{tracking_number}",
            get(routes::trackings::get_by_number::<S>),
        )
        .route(
            "/trackings/{id}",
            get(routes::trackings::get::<S>)
                .patch(routes::trackings::update_details::<S>)
                .delete(routes::trackings::delete::<S>),
        )
        .route(
            "/trackings/{id}/status",
            put(routes::trackings::update_status::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over `store` with a fresh notifier.
pub fn create_default_state<S: Store>(store: S, policy: ShippingPolicy) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store, BroadcastNotifier::default(), policy))
}

/// Catalog used when no database is configured.
pub fn demo_products() -> Vec<Product> {
    vec![
        Product::new("SKU-001", "Mechanical Keyboard", Money::from_units(100), 50),
        Product::new("SKU-002", "Wireless Mouse", Money::from_cents(2_550), 100),
        Product::new("SKU-003", "4K Monitor", Money::from_units(450), 10),
        Product::new("SKU-004", "Standing Desk", Money::from_units(25_000), 3),
    ]
}

/// In-memory store seeded with [`demo_products`].
pub fn demo_store() -> InMemoryStore {
    InMemoryStore::with_products(demo_products())
}
