//! Order entity.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::tracking::TrackingStatus;
use crate::value_objects::{Money, ProductId};

use super::{OrderError, OrderStatus, OrderSummary, ShippingPolicy, generate_order_number};

/// A priced line of an order. Immutable once the order exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: i64,
    pub subtotal: Money,
}

impl OrderLine {
    /// Creates a line, computing its subtotal.
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        quantity: i64,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            price,
            quantity,
            subtotal: price.multiply(quantity),
        }
    }

    /// Snapshots a cart line at its captured price.
    pub fn from_cart_item(item: &CartItem) -> Self {
        Self::new(item.product_id.clone(), item.name.clone(), item.price, item.quantity)
    }
}

/// Delivery and payment details supplied at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub shipping_address: String,
    pub payment_method: String,
    #[serde(default)]
    pub shipping_method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl OrderDetails {
    /// Creates details with the two required fields.
    pub fn new(shipping_address: impl Into<String>, payment_method: impl Into<String>) -> Self {
        Self {
            shipping_address: shipping_address.into(),
            payment_method: payment_method.into(),
            shipping_method: None,
            notes: None,
        }
    }

    /// Checks the required fields: shipping address, then payment method.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.shipping_address.trim().is_empty() {
            return Err(OrderError::ShippingAddressRequired);
        }
        if self.payment_method.trim().is_empty() {
            return Err(OrderError::PaymentMethodRequired);
        }
        Ok(())
    }
}

/// A placed order.
///
/// Lines and amounts are a snapshot taken at checkout. Only the status,
/// cancellation reason and tracking fields change afterwards, through the
/// methods below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub lines: Vec<OrderLine>,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub total_amount: Money,
    pub shipping_address: String,
    pub payment_method: String,
    pub shipping_method: Option<String>,
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub cancellation_reason: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds a pending order from validated lines.
    ///
    /// The subtotal is derived from the lines alone; shipping follows `policy`.
    pub fn place(
        user_id: UserId,
        lines: Vec<OrderLine>,
        details: OrderDetails,
        policy: &ShippingPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        let subtotal: Money = lines.iter().map(|l| l.subtotal).sum();
        let summary = policy.summarize(subtotal);

        Self {
            id: OrderId::new(),
            order_number: generate_order_number(now),
            user_id,
            lines,
            subtotal: summary.subtotal,
            shipping_cost: summary.shipping_cost,
            total_amount: summary.total,
            shipping_address: details.shipping_address,
            payment_method: details.payment_method,
            shipping_method: details.shipping_method,
            notes: details.notes,
            status: OrderStatus::Pending,
            cancellation_reason: None,
            tracking_number: None,
            carrier_name: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the price breakdown.
    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            subtotal: self.subtotal,
            shipping_cost: self.shipping_cost,
            total: self.total_amount,
        }
    }

    /// Returns the total quantity across lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Cancels a pending order. Irreversible.
    pub fn cancel(&mut self, reason: &str, now: DateTime<Utc>) -> Result<(), OrderError> {
        if reason.trim().is_empty() {
            return Err(OrderError::CancellationReasonRequired);
        }
        if !self.status.can_cancel() {
            return Err(OrderError::InvalidState {
                current: self.status,
                action: "cancel",
            });
        }

        self.status = OrderStatus::Cancelled;
        self.cancellation_reason = Some(reason.trim().to_string());
        self.updated_at = now;
        Ok(())
    }

    /// Records the carrier assignment and moves the order in transit.
    pub fn assign_tracking(
        &mut self,
        tracking_number: &str,
        carrier_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if tracking_number.trim().is_empty() {
            return Err(OrderError::TrackingNumberRequired);
        }
        if carrier_name.trim().is_empty() {
            return Err(OrderError::CarrierNameRequired);
        }
        if !self.status.can_assign_tracking() {
            return Err(OrderError::InvalidState {
                current: self.status,
                action: "assign tracking",
            });
        }

        self.tracking_number = Some(tracking_number.trim().to_string());
        self.carrier_name = Some(carrier_name.trim().to_string());
        self.status = OrderStatus::InTransit;
        self.updated_at = now;
        Ok(())
    }

    /// Mirrors shipment progress onto the order.
    ///
    /// Cancelled and delivered orders are left untouched. Returns true if the
    /// status changed.
    pub fn sync_with_shipment(&mut self, shipment: TrackingStatus, now: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        match OrderStatus::from_shipment(shipment) {
            Some(next) if next != self.status => {
                self.status = next;
                self.updated_at = now;
                true
            }
            _ => false,
        }
    }
}
