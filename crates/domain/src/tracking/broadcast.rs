//! Periodic push of active shipments.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::DomainError;
use crate::notification::{ActiveTrackingsSnapshot, Notification, NotificationSink};
use crate::repository::Store;

/// Shortest period the broadcaster ticks at; `tokio::time::interval`
/// rejects a zero period.
pub const MIN_BROADCAST_PERIOD: Duration = Duration::from_millis(1);

/// Publishes the list of active trackings on a fixed interval.
pub struct ActiveTrackingBroadcaster<S, N> {
    store: S,
    notifier: N,
}

impl<S, N> ActiveTrackingBroadcaster<S, N>
where
    S: Store,
    N: NotificationSink + 'static,
{
    pub fn new(store: S, notifier: N) -> Self {
        Self { store, notifier }
    }

    /// Publishes one snapshot and returns how many trackings it carried.
    pub async fn broadcast_once(&self) -> Result<usize, DomainError> {
        let trackings = self.store.list_active_trackings().await?;
        let count = trackings.len();

        if let Err(e) = self
            .notifier
            .publish(Notification::ActiveTrackings(ActiveTrackingsSnapshot {
                trackings,
                timestamp: Utc::now(),
            }))
            .await
        {
            metrics::counter!("notifications_failed_total").increment(1);
            tracing::warn!(error = %e, "active tracking broadcast failed");
        }
        Ok(count)
    }

    /// Runs [`Self::broadcast_once`] every `period` (at least
    /// [`MIN_BROADCAST_PERIOD`]) until `shutdown` flips to true or its sender
    /// is dropped.
    pub fn spawn(self, period: Duration, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let period = period.max(MIN_BROADCAST_PERIOD);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            tracing::info!(period_secs = period.as_secs(), "tracking broadcaster started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match self.broadcast_once().await {
                            Ok(count) => tracing::debug!(count, "broadcast active trackings"),
                            Err(e) => tracing::warn!(error = %e, "failed to list active trackings"),
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("tracking broadcaster stopped");
        })
    }
}
