//! Periodic order sweep.
//!
//! Runs hourly outside request context: orders still `pending` two days
//! after creation are promoted to `in_progress`, and one delivery-reminder
//! notification is created per affected order. Deployments without
//! background-process support disable the sweep via configuration.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use stitchdesk_core::NotificationKind;

use crate::db::{NotificationStore, OrderStore, RepositoryError};
use crate::models::NewNotification;

/// Age past which a pending order is considered stale.
const STALE_AFTER_DAYS: i64 = 2;

/// Sweep cadence.
const SWEEP_INTERVAL_SECS: u64 = 3600;

/// The periodic order sweep.
#[derive(Clone)]
pub struct OrderSweep {
    orders: Arc<dyn OrderStore>,
    notifications: Arc<dyn NotificationStore>,
}

impl OrderSweep {
    /// Create a new sweep.
    #[must_use]
    pub fn new(orders: Arc<dyn OrderStore>, notifications: Arc<dyn NotificationStore>) -> Self {
        Self {
            orders,
            notifications,
        }
    }

    /// Run one sweep pass at `now`. Returns the number of promoted orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the promotion or the reminder
    /// batch.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let cutoff = now - Duration::days(STALE_AFTER_DAYS);
        let promoted = self.orders.promote_stale_pending(cutoff).await?;

        if promoted.is_empty() {
            return Ok(0);
        }

        let reminders: Vec<NewNotification> = promoted
            .iter()
            .map(|order| NewNotification {
                tenant_id: order.tenant_id,
                title: "Delivery reminder".to_owned(),
                body: format!(
                    "Order \"{}\" has been waiting since {} and is now in progress.",
                    order.title,
                    order.created_at.format("%Y-%m-%d")
                ),
                kind: NotificationKind::Delivery,
            })
            .collect();

        self.notifications.create_many(&reminders).await?;

        let count = promoted.len() as u64;
        tracing::info!(count, "stale pending orders promoted");
        Ok(count)
    }

    /// Spawn the hourly sweep loop.
    pub fn spawn_hourly(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(SWEEP_INTERVAL_SECS));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if let Err(e) = self.run_once(Utc::now()).await {
                    tracing::error!(error = %e, "order sweep failed");
                }
            }
        })
    }
}
