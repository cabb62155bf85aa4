//! Tracking commands.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::TrackingStatus;

/// Requested status change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackingStatusUpdate {
    pub status: TrackingStatus,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TrackingStatusUpdate {
    pub fn new(status: TrackingStatus) -> Self {
        Self {
            status,
            location: None,
            notes: None,
        }
    }

    /// Sets the location reported with the change.
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Partial edit of carrier details. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingDetailsUpdate {
    pub carrier_name: Option<String>,
    pub carrier_phone: Option<String>,
    pub estimated_delivery_date: Option<DateTime<Utc>>,
    pub current_location: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}
