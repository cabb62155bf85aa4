//! Outbound notifications.
//!
//! Publishing is best-effort: a failed publish never rolls back the change
//! that produced the notification.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{RwLock, broadcast};

use crate::order::Order;
use crate::tracking::{Tracking, TrackingNotification};
use crate::value_objects::Money;

/// Messages pushed to connected clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Notification {
    /// A shipment changed status.
    TrackingUpdated(TrackingNotification),

    /// An order was placed.
    OrderConfirmed(OrderConfirmation),

    /// Periodic snapshot of every active shipment.
    ActiveTrackings(ActiveTrackingsSnapshot),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub total_amount: Money,
    pub tracking_number: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl OrderConfirmation {
    pub fn for_order(order: &Order, tracking_number: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            order_id: order.id,
            order_number: order.order_number.clone(),
            user_id: order.user_id,
            total_amount: order.total_amount,
            tracking_number,
            timestamp: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTrackingsSnapshot {
    pub trackings: Vec<Tracking>,
    pub timestamp: DateTime<Utc>,
}

/// Errors that can occur while publishing.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification channel closed")]
    ChannelClosed,

    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Push channel for notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, notification: Notification) -> Result<(), NotificationError>;
}

#[async_trait]
impl<T: NotificationSink + ?Sized> NotificationSink for Arc<T> {
    async fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        (**self).publish(notification).await
    }
}

/// Publishes and swallows failures, logging and counting them.
pub async fn publish_best_effort<N: NotificationSink + ?Sized>(
    sink: &N,
    notification: Notification,
) {
    if let Err(e) = sink.publish(notification).await {
        metrics::counter!("notifications_failed_total").increment(1);
        tracing::warn!(error = %e, "failed to publish notification");
    }
}

/// Fans notifications out to every subscriber of a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    /// Creates a notifier buffering up to `capacity` messages per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl NotificationSink for BroadcastNotifier {
    async fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        // An empty audience is not a failure.
        if self.sender.send(notification).is_err() {
            tracing::debug!("no notification subscribers");
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RecordingState {
    published: Vec<Notification>,
}

/// Keeps every published notification in memory. Used by tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    state: Arc<RwLock<RecordingState>>,
    fail_on_publish: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent publishes fail.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.fail_on_publish.store(fail, Ordering::SeqCst);
    }

    pub async fn published(&self) -> Vec<Notification> {
        self.state.read().await.published.clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        if self.fail_on_publish.load(Ordering::SeqCst) {
            return Err(NotificationError::Delivery("simulated failure".to_string()));
        }
        self.state.write().await.published.push(notification);
        Ok(())
    }
}
