//! Human-readable order numbers.
//!
//! Order numbers are labels, not keys: the random suffix is not checked for
//! uniqueness and collisions are tolerated.

use chrono::{DateTime, Utc};
use rand::Rng;

const PREFIX: &str = "ORD";

/// Generates `ORD-YYYYMMDD-NNNNN` for the UTC date of `now`.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::rng().random_range(0..100_000);
    format!("{PREFIX}-{}-{suffix:05}", now.format("%Y%m%d"))
}

/// Returns true if `value` has the order number shape.
pub fn is_order_number(value: &str) -> bool {
    let mut parts = value.split('-');
    let (Some(prefix), Some(date), Some(suffix), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    prefix == PREFIX
        && date.len() == 8
        && date.bytes().all(|b| b.is_ascii_digit())
        && suffix.len() == 5
        && suffix.bytes().all(|b| b.is_ascii_digit())
}
