//! Shipment status state machine.

use serde::{Deserialize, Serialize};

/// The status of a shipment.
///
/// State transitions:
/// ```text
/// Pending ──► InTransit ◄──► OutForDelivery ──► Delivered ──► Returned
///    │            │                 │
///    └────────────┴─────────────────┴──► Cancelled
/// ```
///
/// `Preparing` is declared for storage compatibility only: nothing
/// transitions into or out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    /// Registered, waiting for pickup.
    #[default]
    Pending,

    /// Reserved status without transitions.
    Preparing,

    /// Moving through the carrier network.
    InTransit,

    /// On the last leg.
    OutForDelivery,

    /// Handed to the customer.
    Delivered,

    /// Shipment cancelled (terminal state).
    Cancelled,

    /// Sent back after delivery (terminal state).
    Returned,
}

impl TrackingStatus {
    /// Returns every status, in declaration order.
    pub const ALL: [TrackingStatus; 7] = [
        TrackingStatus::Pending,
        TrackingStatus::Preparing,
        TrackingStatus::InTransit,
        TrackingStatus::OutForDelivery,
        TrackingStatus::Delivered,
        TrackingStatus::Cancelled,
        TrackingStatus::Returned,
    ];

    /// Returns the statuses reachable in one step from this one.
    pub fn allowed_transitions(&self) -> &'static [TrackingStatus] {
        use TrackingStatus::*;
        match self {
            Pending => &[InTransit, Cancelled],
            InTransit => &[OutForDelivery, Cancelled],
            OutForDelivery => &[Delivered, InTransit, Cancelled],
            Delivered => &[Returned],
            Preparing | Cancelled | Returned => &[],
        }
    }

    /// Returns true if `next` is reachable in one step.
    pub fn can_transition_to(&self, next: TrackingStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrackingStatus::Cancelled | TrackingStatus::Returned)
    }

    /// Returns true if carrier details can no longer be edited.
    pub fn is_locked(&self) -> bool {
        matches!(self, TrackingStatus::Delivered | TrackingStatus::Cancelled)
    }

    /// Returns true if a tracking in this status may be deleted.
    pub fn is_deletable(&self) -> bool {
        matches!(self, TrackingStatus::Pending | TrackingStatus::Cancelled)
    }

    /// Returns the stored status code.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingStatus::Pending => "pending",
            TrackingStatus::Preparing => "preparing",
            TrackingStatus::InTransit => "in_transit",
            TrackingStatus::OutForDelivery => "out_for_delivery",
            TrackingStatus::Delivered => "delivered",
            TrackingStatus::Cancelled => "cancelled",
            TrackingStatus::Returned => "returned",
        }
    }

    /// Renders the customer-facing message for a shipment entering this status.
    pub fn message(&self, tracking_number: &str, location: Option<&str>) -> String {
        let location = location.unwrap_or("its destination");
        match self {
            TrackingStatus::Pending => {
                format!("Shipment {tracking_number} is registered and awaiting pickup")
            }
            TrackingStatus::Preparing => format!("Shipment {tracking_number} is being prepared"),
            TrackingStatus::InTransit => format!("Your order is in transit toward {location}"),
            TrackingStatus::OutForDelivery => {
                format!("Your order is out for delivery in {location}")
            }
            TrackingStatus::Delivered => format!("Your order was delivered at {location}"),
            TrackingStatus::Cancelled => format!("Shipment {tracking_number} was cancelled"),
            TrackingStatus::Returned => {
                format!("Shipment {tracking_number} was returned to the sender")
            }
        }
    }
}

impl std::fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TrackingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrackingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown tracking status: {s}"))
    }
}
