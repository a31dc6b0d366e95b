//! Notification broadcast selector.
//!
//! Resolves a targeting criterion into a tenant subset, persists one
//! notification per target, then dispatches a single batched push to the
//! opted-in subset. Push delivery is best-effort and decoupled: a delivery
//! failure never rolls back the already-persisted notifications.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use stitchdesk_core::{BroadcastCriterion, SubscriptionStatus, SubscriptionTier};

use crate::db::{NotificationStore, RepositoryError, TenantStore};
use crate::models::{NewNotification, Tenant};
use crate::services::push::PushSender;

/// Window ahead of `now` that counts as "expiring soon".
const EXPIRING_SOON_DAYS: i64 = 7;

/// Counts reported back to the broadcast caller.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct BroadcastOutcome {
    pub notified_count: u64,
    pub push_success: u32,
    pub push_failed: u32,
}

/// The notification broadcast selector.
#[derive(Clone)]
pub struct Broadcaster {
    tenants: Arc<dyn TenantStore>,
    notifications: Arc<dyn NotificationStore>,
    push: Arc<dyn PushSender>,
}

impl Broadcaster {
    /// Create a new broadcaster.
    #[must_use]
    pub fn new(
        tenants: Arc<dyn TenantStore>,
        notifications: Arc<dyn NotificationStore>,
        push: Arc<dyn PushSender>,
    ) -> Self {
        Self {
            tenants,
            notifications,
            push,
        }
    }

    /// Compute the target set for `criterion` at `now`.
    ///
    /// The result is ordered (signup order), duplicate-free by construction,
    /// and never contains admin tenants.
    ///
    /// # Errors
    ///
    /// Returns an error if the tenant listing fails.
    pub async fn select_targets(
        &self,
        criterion: BroadcastCriterion,
        now: DateTime<Utc>,
    ) -> Result<Vec<Tenant>, RepositoryError> {
        let tenants = self.tenants.list_non_admin().await?;
        Ok(tenants
            .into_iter()
            .filter(|t| matches_criterion(criterion, t, now))
            .collect())
    }

    /// Broadcast `title`/`message` to the tenants selected by `criterion`.
    ///
    /// # Errors
    ///
    /// Returns an error if target selection or notification persistence
    /// fails. Push dispatch failures are absorbed into the outcome counts.
    pub async fn broadcast(
        &self,
        criterion: BroadcastCriterion,
        title: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<BroadcastOutcome, RepositoryError> {
        let targets = self.select_targets(criterion, now).await?;
        let kind = criterion.notification_kind();

        let batch: Vec<NewNotification> = targets
            .iter()
            .map(|t| NewNotification {
                tenant_id: t.id,
                title: title.to_owned(),
                body: message.to_owned(),
                kind,
            })
            .collect();

        let notified_count = self.notifications.create_many(&batch).await?;

        let tokens: Vec<String> = targets
            .iter()
            .filter(|t| t.push_enabled)
            .filter_map(|t| t.push_token.clone())
            .collect();

        let data = serde_json::json!({ "kind": kind });
        let (push_success, push_failed) = match self.push.send(&tokens, title, message, &data).await
        {
            Ok(receipt) => (receipt.success_count, receipt.failure_count),
            Err(e) => {
                // Notifications are already persisted; delivery is
                // best-effort.
                tracing::warn!(error = %e, "push dispatch failed");
                (0, u32::try_from(tokens.len()).unwrap_or(u32::MAX))
            }
        };

        tracing::info!(
            ?criterion,
            notified_count,
            push_success,
            push_failed,
            "broadcast complete"
        );

        Ok(BroadcastOutcome {
            notified_count,
            push_success,
            push_failed,
        })
    }
}

/// Whether `tenant` falls under `criterion` at `now`.
fn matches_criterion(criterion: BroadcastCriterion, tenant: &Tenant, now: DateTime<Utc>) -> bool {
    let sub = &tenant.subscription;
    match criterion {
        BroadcastCriterion::ExpiringSoon => {
            sub.status == SubscriptionStatus::Active
                && tenant.relevant_end_date().is_some_and(|end| {
                    end >= now && end <= now + Duration::days(EXPIRING_SOON_DAYS)
                })
        }
        // Union of stored-expired and lazily-expired tenants: a tenant whose
        // window lapsed but who has not been read (and thus swept) since
        // still counts.
        BroadcastCriterion::Expired => {
            sub.status == SubscriptionStatus::Expired
                || (sub.status == SubscriptionStatus::Active
                    && tenant.relevant_end_date().is_some_and(|end| end < now))
        }
        BroadcastCriterion::TrialUsers => {
            sub.tier == Some(SubscriptionTier::Trial) && sub.status == SubscriptionStatus::Active
        }
        BroadcastCriterion::All => true,
    }
}
