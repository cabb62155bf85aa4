//! Order status.

use serde::{Deserialize, Serialize};

use crate::tracking::TrackingStatus;

/// The status of an order.
///
/// Statuses are stored and serialized with their historical codes
/// (`PENDIENTE`, `EN_TRANSITO`, ...).
///
/// ```text
/// Pending ──┬──► InTransit ◄──► OutForDelivery ──► Delivered
///           │        (mirrors the shipment tracking)
///           └──► Cancelled   (explicit cancellation, Pending only)
/// ```
///
/// `Preparing` is a declared code that nothing transitions into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order placed, not shipped yet.
    #[default]
    #[serde(rename = "PENDIENTE")]
    Pending,

    /// Reserved code; nothing transitions into it.
    #[serde(rename = "PREPARANDO")]
    Preparing,

    /// Handed to the carrier.
    #[serde(rename = "EN_TRANSITO")]
    InTransit,

    /// Out for delivery.
    #[serde(rename = "EN_ENTREGA")]
    OutForDelivery,

    /// Delivered (terminal state).
    #[serde(rename = "ENTREGADO")]
    Delivered,

    /// Cancelled (terminal state).
    #[serde(rename = "CANCELADO")]
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the order can be cancelled in this status.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if tracking can be assigned in this status.
    pub fn can_assign_tracking(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Preparing)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Maps shipment progress onto the order, if it moves the order at all.
    pub fn from_shipment(status: TrackingStatus) -> Option<Self> {
        match status {
            TrackingStatus::InTransit => Some(OrderStatus::InTransit),
            TrackingStatus::OutForDelivery => Some(OrderStatus::OutForDelivery),
            TrackingStatus::Delivered => Some(OrderStatus::Delivered),
            TrackingStatus::Pending
            | TrackingStatus::Preparing
            | TrackingStatus::Cancelled
            | TrackingStatus::Returned => None,
        }
    }

    /// Returns the stored status code.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDIENTE",
            OrderStatus::Preparing => "PREPARANDO",
            OrderStatus::InTransit => "EN_TRANSITO",
            OrderStatus::OutForDelivery => "EN_ENTREGA",
            OrderStatus::Delivered => "ENTREGADO",
            OrderStatus::Cancelled => "CANCELADO",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDIENTE" => Ok(OrderStatus::Pending),
            "PREPARANDO" => Ok(OrderStatus::Preparing),
            "EN_TRANSITO" => Ok(OrderStatus::InTransit),
            "EN_ENTREGA" => Ok(OrderStatus::OutForDelivery),
            "ENTREGADO" => Ok(OrderStatus::Delivered),
            "CANCELADO" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::InTransit,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_only_pending_can_cancel() {
        for status in ALL {
            assert_eq!(status.can_cancel(), status == OrderStatus::Pending);
        }
    }

    #[test]
    fn test_legacy_codes_are_not_statuses() {
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert!("completed".parse::<OrderStatus>().is_err());
        assert!(serde_json::from_str::<OrderStatus>("\"shipped\"").is_err());
    }

    #[test]
    fn test_codes_round_trip_through_from_str() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_serializes_with_stored_code() {
        let json = serde_json::to_string(&OrderStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"EN_ENTREGA\"");
    }

    #[test]
    fn test_shipment_mapping() {
        assert_eq!(
            OrderStatus::from_shipment(TrackingStatus::InTransit),
            Some(OrderStatus::InTransit)
        );
        assert_eq!(
            OrderStatus::from_shipment(TrackingStatus::Delivered),
            Some(OrderStatus::Delivered)
        );
        assert_eq!(OrderStatus::from_shipment(TrackingStatus::Cancelled), None);
        assert_eq!(OrderStatus::from_shipment(TrackingStatus::Returned), None);
    }
}
