//! Order commands.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::Deserialize;

/// Command to cancel a pending order.
#[derive(Debug, Clone)]
pub struct CancelOrder {
    /// The order to cancel.
    pub order_id: OrderId,

    /// Mandatory reason, stored on the order.
    pub reason: String,
}

impl CancelOrder {
    /// Creates a new CancelOrder command.
    pub fn new(order_id: OrderId, reason: impl Into<String>) -> Self {
        Self {
            order_id,
            reason: reason.into(),
        }
    }
}

/// Carrier data attached to an order when it ships.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackingAssignment {
    pub tracking_number: String,
    pub carrier_name: String,
    #[serde(default)]
    pub carrier_phone: Option<String>,
    #[serde(default)]
    pub estimated_delivery_date: Option<DateTime<Utc>>,
}

impl TrackingAssignment {
    /// Creates an assignment with the two required fields.
    pub fn new(tracking_number: impl Into<String>, carrier_name: impl Into<String>) -> Self {
        Self {
            tracking_number: tracking_number.into(),
            carrier_name: carrier_name.into(),
            ..Self::default()
        }
    }
}

/// Command to attach shipment tracking to an order.
#[derive(Debug, Clone)]
pub struct AssignTracking {
    /// The order being shipped.
    pub order_id: OrderId,

    /// Carrier data.
    pub assignment: TrackingAssignment,
}

impl AssignTracking {
    /// Creates a new AssignTracking command.
    pub fn new(order_id: OrderId, assignment: TrackingAssignment) -> Self {
        Self {
            order_id,
            assignment,
        }
    }
}
