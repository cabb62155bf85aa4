//! Domain layer for the commerce backend.
//!
//! This crate provides:
//! - Cart entity with sliding expiration, price locks and per-user locking
//! - Order creation rules, shipping policy and cancellation
//! - Shipment tracking state machine and notifications
//! - Persistence ports, plus an in-memory store implementing all of them

pub mod cart;
pub mod catalog;
pub mod error;
pub mod memory;
pub mod notification;
pub mod order;
pub mod repository;
pub mod tracking;
pub mod value_objects;

pub use cart::{
    AddCartItem, CART_TTL, Cart, CartError, CartItem, CartService, CartStatus, NewCartItem,
    PRICE_LOCK_DURATION, RemoveCartItem, UpdateCartItem, UserLockGuard, UserLocks,
};
pub use catalog::{Product, StockDecrement};
pub use error::{DomainError, StoreError};
pub use memory::InMemoryStore;
pub use notification::{
    ActiveTrackingsSnapshot, BroadcastNotifier, Notification, NotificationError,
    NotificationSink, OrderConfirmation, RecordingNotifier, publish_best_effort,
};
pub use order::{
    AssignTracking, CancelOrder, DraftLine, Order, OrderDetails, OrderDraft, OrderError,
    OrderLine, OrderService, OrderStatus, OrderSummary, ShippingPolicy, TrackingAssignment,
    price_line,
};
pub use repository::{
    CartRepository, OrderRepository, ProductCatalog, Store, StoreResult, TrackingRepository,
};
pub use tracking::{
    ActiveTrackingBroadcaster, Tracking, TrackingDetailsUpdate, TrackingError,
    TrackingNotification, TrackingService, TrackingStatus, TrackingStatusUpdate,
};
pub use value_objects::{Money, ProductId};
