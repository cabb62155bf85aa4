//! Shipment tracking: status engine, carrier details and notifications.

mod aggregate;
mod broadcast;
mod commands;
mod number;
mod service;
mod status;

pub use aggregate::{Tracking, TrackingNotification};
pub use broadcast::{ActiveTrackingBroadcaster, MIN_BROADCAST_PERIOD};
pub use commands::{TrackingDetailsUpdate, TrackingStatusUpdate};
pub use number::{MAX_TRACKING_NUMBER_ATTEMPTS, generate_tracking_number};
pub use service::{NumberGenerator, TrackingService};
pub use status::TrackingStatus;

use common::TrackingId;
use thiserror::Error;

/// Errors that can occur during tracking operations.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// The status table forbids the move.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: TrackingStatus,
        to: TrackingStatus,
    },

    #[error("Tracking {tracking_id} is inactive")]
    Inactive { tracking_id: TrackingId },

    /// Delivered and cancelled shipments are read-only.
    #[error("Tracking in {status} status can no longer be modified")]
    Locked { status: TrackingStatus },

    #[error("Tracking in {status} status cannot be deleted")]
    NotDeletable { status: TrackingStatus },

    /// Every generated tracking number collided.
    #[error("Could not generate a unique tracking number after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },

    /// The tracking number belongs to another order.
    #[error("Tracking number already in use: {tracking_number}")]
    DuplicateTrackingNumber { tracking_number: String },
}
