//! Tracking number generation.

use chrono::{DateTime, Utc};
use rand::Rng;

/// Upper bound on regeneration attempts after tracking number collisions.
pub const MAX_TRACKING_NUMBER_ATTEMPTS: u32 = 5;

/// Generates `TRK` + last six digits of the millisecond timestamp + three
/// random digits.
pub fn generate_tracking_number(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().rem_euclid(1_000_000);
    let random: u16 = rand::rng().random_range(0..1000);
    format!("TRK{millis:06}{random:03}")
}
