//! Tracking entity.

use chrono::{DateTime, Utc};
use common::{OrderId, TrackingId};
use serde::{Deserialize, Serialize};

use crate::order::TrackingAssignment;

use super::{TrackingDetailsUpdate, TrackingError, TrackingStatus, TrackingStatusUpdate};

/// Shipment tracking for one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracking {
    pub id: TrackingId,
    pub order_id: OrderId,
    pub tracking_number: String,
    pub status: TrackingStatus,
    pub current_location: Option<String>,
    pub carrier_name: Option<String>,
    pub carrier_phone: Option<String>,
    pub estimated_delivery_date: Option<DateTime<Utc>>,
    pub actual_delivery_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Emitted on every successful status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingNotification {
    pub tracking_id: TrackingId,
    pub order_id: OrderId,
    pub tracking_number: String,
    pub status: TrackingStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Tracking {
    /// Creates an active, pending tracking.
    pub fn new(order_id: OrderId, tracking_number: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: TrackingId::new(),
            order_id,
            tracking_number: tracking_number.into(),
            status: TrackingStatus::Pending,
            current_location: None,
            carrier_name: None,
            carrier_phone: None,
            estimated_delivery_date: None,
            actual_delivery_date: None,
            notes: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the shipment to a new status and returns the notification to
    /// publish.
    pub fn transition(
        &mut self,
        update: TrackingStatusUpdate,
        now: DateTime<Utc>,
    ) -> Result<TrackingNotification, TrackingError> {
        self.ensure_active()?;

        if !self.status.can_transition_to(update.status) {
            return Err(TrackingError::InvalidTransition {
                from: self.status,
                to: update.status,
            });
        }

        self.status = update.status;
        if let Some(location) = update.location.filter(|l| !l.trim().is_empty()) {
            self.current_location = Some(location);
        }
        if update.notes.is_some() {
            self.notes = update.notes;
        }
        if self.status == TrackingStatus::Delivered {
            self.actual_delivery_date = Some(now);
        }
        self.updated_at = now;

        Ok(TrackingNotification {
            tracking_id: self.id,
            order_id: self.order_id,
            tracking_number: self.tracking_number.clone(),
            status: self.status,
            message: self
                .status
                .message(&self.tracking_number, self.current_location.as_deref()),
            timestamp: now,
        })
    }

    /// Edits carrier details. Only provided fields change.
    pub fn update_details(
        &mut self,
        update: TrackingDetailsUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), TrackingError> {
        self.ensure_editable()?;

        if let Some(carrier_name) = update.carrier_name {
            self.carrier_name = Some(carrier_name);
        }
        if let Some(carrier_phone) = update.carrier_phone {
            self.carrier_phone = Some(carrier_phone);
        }
        if let Some(date) = update.estimated_delivery_date {
            self.estimated_delivery_date = Some(date);
        }
        if let Some(location) = update.current_location {
            self.current_location = Some(location);
        }
        if let Some(notes) = update.notes {
            self.notes = Some(notes);
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Applies a carrier assignment made from the order side.
    pub fn apply_assignment(
        &mut self,
        assignment: &TrackingAssignment,
        now: DateTime<Utc>,
    ) -> Result<(), TrackingError> {
        self.ensure_editable()?;

        self.tracking_number = assignment.tracking_number.trim().to_string();
        self.carrier_name = Some(assignment.carrier_name.trim().to_string());
        if assignment.carrier_phone.is_some() {
            self.carrier_phone = assignment.carrier_phone.clone();
        }
        if assignment.estimated_delivery_date.is_some() {
            self.estimated_delivery_date = assignment.estimated_delivery_date;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn ensure_deletable(&self) -> Result<(), TrackingError> {
        if !self.status.is_deletable() {
            return Err(TrackingError::NotDeletable {
                status: self.status,
            });
        }
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), TrackingError> {
        if !self.is_active {
            return Err(TrackingError::Inactive {
                tracking_id: self.id,
            });
        }
        Ok(())
    }

    fn ensure_editable(&self) -> Result<(), TrackingError> {
        self.ensure_active()?;
        if self.status.is_locked() {
            return Err(TrackingError::Locked {
                status: self.status,
            });
        }
        Ok(())
    }
}
