//! Orders: creation from checkout input, cancellation and carrier assignment.

mod aggregate;
mod commands;
mod draft;
mod number;
mod pricing;
mod service;
mod status;

pub use aggregate::{Order, OrderDetails, OrderLine};
pub use commands::{AssignTracking, CancelOrder, TrackingAssignment};
pub use draft::{DraftLine, OrderDraft, price_line};
pub use number::{generate_order_number, is_order_number};
pub use pricing::{FLAT_SHIPPING_FEE, FREE_SHIPPING_THRESHOLD, OrderSummary, ShippingPolicy};
pub use service::OrderService;
pub use status::OrderStatus;

use thiserror::Error;

use crate::value_objects::Money;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order has no owner.
    #[error("User is required")]
    UserRequired,

    /// Checkout without products.
    #[error("At least one product is required")]
    NoProducts,

    /// Missing shipping address.
    #[error("Shipping address is required")]
    ShippingAddressRequired,

    /// Missing payment method.
    #[error("Payment method is required")]
    PaymentMethodRequired,

    /// A requested product does not exist.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// Invalid quantity.
    #[error("Invalid quantity for {product_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { product_id: String, quantity: i64 },

    /// Invalid price.
    #[error("Invalid price for {product_id}: {cents} cents")]
    InvalidPrice { product_id: String, cents: i64 },

    /// Catalog stock does not cover the requested quantity.
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// Order is not in a status that allows the action.
    #[error("Invalid order state: cannot {action} an order in {current} status")]
    InvalidState {
        current: OrderStatus,
        action: &'static str,
    },

    /// Cancellation without a reason.
    #[error("Cancellation reason is required")]
    CancellationReasonRequired,

    /// Tracking assignment without a tracking number.
    #[error("Tracking number is required")]
    TrackingNumberRequired,

    /// Tracking assignment without a carrier.
    #[error("Carrier name is required")]
    CarrierNameRequired,

    /// The order subtotal disagrees with the cart it came from.
    #[error("Order subtotal {order_subtotal} does not match cart total {cart_total}")]
    TotalMismatch {
        order_subtotal: Money,
        cart_total: Money,
    },
}
