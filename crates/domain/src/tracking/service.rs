//! Tracking service: creation, status engine and shipment queries.

use chrono::{DateTime, Utc};
use common::{OrderId, TrackingId};

use crate::error::{DomainError, StoreError};
use crate::notification::{Notification, NotificationSink, publish_best_effort};
use crate::order::Order;
use crate::repository::Store;

use super::{
    MAX_TRACKING_NUMBER_ATTEMPTS, Tracking, TrackingDetailsUpdate, TrackingError,
    TrackingNotification, TrackingStatus, TrackingStatusUpdate, generate_tracking_number,
};

/// Produces candidate tracking numbers.
pub type NumberGenerator = fn(DateTime<Utc>) -> String;

/// Service for managing shipment tracking.
pub struct TrackingService<S: Store, N: NotificationSink> {
    store: S,
    notifier: N,
    generate_number: NumberGenerator,
}

impl<S: Store, N: NotificationSink> TrackingService<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            store,
            notifier,
            generate_number: generate_tracking_number,
        }
    }

    /// Replaces the tracking number generator.
    pub fn with_number_generator(mut self, generate_number: NumberGenerator) -> Self {
        self.generate_number = generate_number;
        self
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Creates the pending tracking of a freshly placed order.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn initialize_for_order(&self, order: &Order) -> Result<Tracking, DomainError> {
        for attempt in 1..=MAX_TRACKING_NUMBER_ATTEMPTS {
            let number = self.unused_number().await?;
            let tracking = Tracking::new(order.id, number, Utc::now());

            match self.store.create_tracking(&tracking).await {
                Ok(()) => {
                    tracing::info!(
                        tracking_number = %tracking.tracking_number,
                        "tracking initialized"
                    );
                    return Ok(tracking);
                }
                // Lost a race for the number; try another.
                Err(StoreError::Conflict(reason)) => {
                    tracing::debug!(attempt, %reason, "tracking number taken");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(TrackingError::GenerationExhausted {
            attempts: MAX_TRACKING_NUMBER_ATTEMPTS,
        }
        .into())
    }

    /// Returns a tracking number not yet present in the store.
    pub async fn unused_number(&self) -> Result<String, DomainError> {
        for _ in 0..MAX_TRACKING_NUMBER_ATTEMPTS {
            let candidate = (self.generate_number)(Utc::now());
            if self
                .store
                .find_tracking_by_number(&candidate)
                .await?
                .is_none()
            {
                return Ok(candidate);
            }
        }

        Err(TrackingError::GenerationExhausted {
            attempts: MAX_TRACKING_NUMBER_ATTEMPTS,
        }
        .into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, tracking_id: TrackingId) -> Result<Tracking, DomainError> {
        self.store
            .find_tracking(tracking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Tracking", tracking_id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_order(&self, order_id: OrderId) -> Result<Tracking, DomainError> {
        self.store
            .find_tracking_by_order(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Tracking for order", order_id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_number(&self, tracking_number: &str) -> Result<Tracking, DomainError> {
        self.store
            .find_tracking_by_number(tracking_number)
            .await?
            .ok_or_else(|| DomainError::not_found("Tracking", tracking_number))
    }

    pub async fn list_active(&self) -> Result<Vec<Tracking>, DomainError> {
        Ok(self.store.list_active_trackings().await?)
    }

    pub async fn list_by_status(
        &self,
        status: TrackingStatus,
    ) -> Result<Vec<Tracking>, DomainError> {
        Ok(self.store.list_trackings_by_status(status).await?)
    }

    /// Applies a status transition, mirrors it onto the order and publishes
    /// the resulting notification.
    #[tracing::instrument(skip(self, update), fields(to = %update.status))]
    pub async fn update_status(
        &self,
        tracking_id: TrackingId,
        update: TrackingStatusUpdate,
    ) -> Result<(Tracking, TrackingNotification), DomainError> {
        let mut tracking = self.get(tracking_id).await?;
        let from = tracking.status;
        let now = Utc::now();

        let notification = tracking.transition(update, now)?;
        self.store.update_tracking(&tracking).await?;

        metrics::counter!(
            "tracking_transitions_total",
            "from" => from.as_str(),
            "to" => tracking.status.as_str()
        )
        .increment(1);
        tracing::info!(%from, to = %tracking.status, "tracking status changed");

        if let Some(mut order) = self.store.find_order(tracking.order_id).await?
            && order.sync_with_shipment(tracking.status, now)
        {
            self.store.update_order(&order).await?;
            tracing::info!(order_id = %order.id, status = %order.status, "order status mirrored");
        }

        publish_best_effort(
            &self.notifier,
            Notification::TrackingUpdated(notification.clone()),
        )
        .await;

        Ok((tracking, notification))
    }

    /// Edits carrier details of an active, non-final tracking.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_details(
        &self,
        tracking_id: TrackingId,
        update: TrackingDetailsUpdate,
    ) -> Result<Tracking, DomainError> {
        let mut tracking = self.get(tracking_id).await?;
        tracking.update_details(update, Utc::now())?;
        self.store.update_tracking(&tracking).await?;
        Ok(tracking)
    }

    /// Deletes a pending or cancelled tracking.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, tracking_id: TrackingId) -> Result<(), DomainError> {
        let tracking = self.get(tracking_id).await?;
        tracking.ensure_deletable()?;

        if !self.store.delete_tracking(tracking_id).await? {
            return Err(DomainError::not_found("Tracking", tracking_id));
        }
        tracing::info!(tracking_number = %tracking.tracking_number, "tracking deleted");
        Ok(())
    }
}
