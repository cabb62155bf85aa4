//! Order service providing queries, cancellation and carrier assignment.

use chrono::Utc;
use common::{OrderId, UserId};

use crate::error::DomainError;
use crate::repository::Store;
use crate::tracking::{Tracking, TrackingError};

use super::{AssignTracking, CancelOrder, Order};

/// Service for managing placed orders.
///
/// Order creation belongs to checkout; this service covers everything that
/// happens to an order afterwards.
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads an order with its lines.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, DomainError> {
        self.store
            .find_order(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", order_id))
    }

    /// Lists a user's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, DomainError> {
        Ok(self.store.list_orders_for_user(user_id).await?)
    }

    /// Cancels a pending order.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, cmd: CancelOrder) -> Result<Order, DomainError> {
        let mut order = self.get_order(cmd.order_id).await?;
        order.cancel(&cmd.reason, Utc::now())?;
        self.store.update_order(&order).await?;

        tracing::info!(order_number = %order.order_number, "order cancelled");
        Ok(order)
    }

    /// Attaches carrier data to a pending or preparing order and moves it in
    /// transit. The order's tracking record is created or updated to match.
    #[tracing::instrument(skip(self))]
    pub async fn assign_tracking(
        &self,
        cmd: AssignTracking,
    ) -> Result<(Order, Tracking), DomainError> {
        let now = Utc::now();
        let mut order = self.get_order(cmd.order_id).await?;
        order.assign_tracking(
            &cmd.assignment.tracking_number,
            &cmd.assignment.carrier_name,
            now,
        )?;
        let tracking_number = cmd.assignment.tracking_number.trim();

        if let Some(owner) = self.store.find_tracking_by_number(tracking_number).await?
            && owner.order_id != order.id
        {
            return Err(TrackingError::DuplicateTrackingNumber {
                tracking_number: tracking_number.to_string(),
            }
            .into());
        }

        let tracking = match self.store.find_tracking_by_order(order.id).await? {
            Some(mut tracking) => {
                tracking.apply_assignment(&cmd.assignment, now)?;
                self.store.update_tracking(&tracking).await?;
                tracking
            }
            None => {
                let mut tracking = Tracking::new(order.id, tracking_number, now);
                tracking.apply_assignment(&cmd.assignment, now)?;
                self.store.create_tracking(&tracking).await?;
                tracking
            }
        };

        self.store.update_order(&order).await?;
        tracing::info!(
            order_number = %order.order_number,
            %tracking_number,
            carrier = %cmd.assignment.carrier_name,
            "tracking assigned"
        );
        Ok((order, tracking))
    }
}
