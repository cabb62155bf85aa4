//! HTTP handlers, one module per resource.

pub mod carts;
pub mod checkout;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod trackings;

use std::fmt::Display;

use common::{OrderId, TrackingId, UserId};

use crate::error::ApiError;

fn parse_id<T, E: Display>(
    kind: &str,
    raw: &str,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> Result<T, ApiError> {
    parse(raw).map_err(|e| ApiError::BadRequest(format!("Invalid {kind} id '{raw}': {e}")))
}

pub(crate) fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    parse_id("user", raw, UserId::parse_str)
}

pub(crate) fn parse_order_id(raw: &str) -> Result<OrderId, ApiError> {
    parse_id("order", raw, OrderId::parse_str)
}

pub(crate) fn parse_tracking_id(raw: &str) -> Result<TrackingId, ApiError> {
    parse_id("tracking", raw, TrackingId::parse_str)
}
