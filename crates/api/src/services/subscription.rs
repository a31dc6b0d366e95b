//! Subscription lifecycle engine.
//!
//! Access state is evaluated lazily: a status query resolves the stored
//! dates against the clock and persists the one-time `active -> expired`
//! transition when a window has lapsed. The only path out of `expired` is a
//! verified payment (or an administrator override).
//!
//! # Calendar arithmetic
//!
//! Paid periods add calendar months via chrono's month arithmetic, which
//! clamps to the last valid day of the target month: `2024-02-29 + 12
//! months = 2025-02-28`, `Jan 31 + 1 month = Feb 28/29`. The same rule
//! applies to administrator overrides.

use std::sync::Arc;

use chrono::{DateTime, Duration, Months, Utc};

use stitchdesk_core::{PaymentStatus, SubscriptionStatus, SubscriptionTier, SubscriptionWindow};

use crate::db::{RepositoryError, TenantStore};
use crate::models::{PaymentRecord, SubscriptionState, Tenant};
use crate::services::payments::VerifiedTransaction;

/// Length of the free-access window granted at signup.
pub const TRIAL_PERIOD_DAYS: i64 = 30;

/// Errors from subscription operations.
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    /// A payment can only buy a paid tier.
    #[error("{0} is not a paid tier")]
    NotAPaidTier(SubscriptionTier),

    /// Date arithmetic left the representable range.
    #[error("date arithmetic out of range")]
    DateOutOfRange,

    /// Store operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// The subscription lifecycle engine.
///
/// Stateless; owns only a handle to the tenant store.
#[derive(Clone)]
pub struct SubscriptionService {
    tenants: Arc<dyn TenantStore>,
}

impl SubscriptionService {
    /// Create a new subscription service.
    #[must_use]
    pub fn new(tenants: Arc<dyn TenantStore>) -> Self {
        Self { tenants }
    }

    /// Resolve the tenant's access window at `now`, lazily persisting the
    /// one-time expiry transition (and trial backfill for legacy records).
    ///
    /// Idempotent: re-evaluating an already-expired tenant performs no
    /// write.
    ///
    /// # Errors
    ///
    /// Returns an error if the expiry write fails.
    pub async fn evaluate(
        &self,
        tenant: &Tenant,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionWindow, SubscriptionError> {
        match resolve(&tenant.subscription, tenant.created_at, now) {
            Resolution::Unchanged(window) => Ok(window),
            Resolution::Persist { state, window } => {
                self.tenants.update_subscription(tenant.id, &state).await?;
                Ok(window)
            }
        }
    }

    /// Apply a verified payment for `tier`, moving the tenant onto an active
    /// paid window starting at `now`.
    ///
    /// Idempotent per transaction reference: if the tenant's history already
    /// holds an entry for `tx.tx_ref`, nothing is written and the stored
    /// state is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::NotAPaidTier`] for the trial tier, or an
    /// error if the store write fails.
    pub async fn apply_payment(
        &self,
        tenant: &Tenant,
        tier: SubscriptionTier,
        tx: &VerifiedTransaction,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionState, SubscriptionError> {
        if tenant.has_payment(&tx.tx_ref) {
            tracing::info!(
                tenant = %tenant.id,
                tx_ref = %tx.tx_ref,
                "payment already recorded, skipping"
            );
            return Ok(tenant.subscription.clone());
        }

        let (started_at, ends_at) = paid_period(tier, now)?;
        let state = SubscriptionState::paid(tier, started_at, ends_at);

        let record = PaymentRecord {
            tx_ref: tx.tx_ref.clone(),
            tier,
            amount: tx.amount,
            currency: tx.currency.clone(),
            status: PaymentStatus::Successful,
            settled_at: now,
        };

        self.tenants
            .record_payment(tenant.id, &record, &state)
            .await?;

        tracing::info!(tenant = %tenant.id, %tier, tx_ref = %tx.tx_ref, "payment applied");

        Ok(state)
    }

    /// Administrator-initiated tier change.
    ///
    /// Follows the same date-calculation rules as a payment, but accepts
    /// explicit start/end overrides when supplied. No history entry is
    /// appended: there is no settled transaction behind the change.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::NotAPaidTier`] for the trial tier, or an
    /// error if the store write fails.
    pub async fn change_tier(
        &self,
        tenant: &Tenant,
        tier: SubscriptionTier,
        started_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionState, SubscriptionError> {
        let start = started_at.unwrap_or(now);
        let end = match ends_at {
            Some(end) => end,
            None => paid_period(tier, start)?.1,
        };

        let state = SubscriptionState::paid(tier, start, end);
        self.tenants.update_subscription(tenant.id, &state).await?;

        Ok(state)
    }
}

/// Outcome of resolving stored subscription state against the clock.
enum Resolution {
    /// Nothing to write; the stored state already matches.
    Unchanged(SubscriptionWindow),
    /// A transition happened (expiry or trial backfill) and must be
    /// persisted.
    Persist {
        state: SubscriptionState,
        window: SubscriptionWindow,
    },
}

/// Pure resolution of `state` at `now`.
///
/// Legacy records with no tier are initialized as a trial anchored at
/// `created_at`; an active window whose end date has passed transitions to
/// expired. Cancelled tenants and tenants with no end date are left alone.
fn resolve(state: &SubscriptionState, created_at: DateTime<Utc>, now: DateTime<Utc>) -> Resolution {
    let mut resolved = state.clone();
    let mut dirty = false;

    if resolved.tier.is_none() {
        let started_at = created_at;
        let ends_at = started_at + Duration::days(TRIAL_PERIOD_DAYS);
        resolved = SubscriptionState::trial(started_at, ends_at);
        dirty = true;
    }

    if resolved.status == SubscriptionStatus::Active
        && let Some(end) = relevant_end_date(&resolved)
        && now > end
    {
        resolved.status = SubscriptionStatus::Expired;
        dirty = true;
    }

    let window = window_of(&resolved, now);

    if dirty {
        Resolution::Persist {
            state: resolved,
            window,
        }
    } else {
        Resolution::Unchanged(window)
    }
}

/// The end date governing the window; trial takes precedence.
fn relevant_end_date(state: &SubscriptionState) -> Option<DateTime<Utc>> {
    state.trial_ends_at.or(state.subscription_ends_at)
}

/// Build the derived window from resolved state.
fn window_of(state: &SubscriptionState, now: DateTime<Utc>) -> SubscriptionWindow {
    let days_remaining = match (state.status, relevant_end_date(state)) {
        (SubscriptionStatus::Active, Some(end)) => days_until(end, now),
        // No end date + active means active indefinitely; expired and
        // cancelled tenants have nothing left either way.
        _ => 0,
    };

    SubscriptionWindow {
        tier: state.tier.unwrap_or_default(),
        status: state.status,
        trial_started_at: state.trial_started_at,
        trial_ends_at: state.trial_ends_at,
        subscription_started_at: state.subscription_started_at,
        subscription_ends_at: state.subscription_ends_at,
        days_remaining,
    }
}

/// Whole days from `now` until `end`, rounded up, never negative.
fn days_until(end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    const DAY_MS: i64 = 86_400_000;

    let ms = (end - now).num_milliseconds();
    if ms <= 0 {
        0
    } else {
        (ms + DAY_MS - 1) / DAY_MS
    }
}

/// Paid window for `tier` starting at `start`: calendar months, clamped to
/// the last valid day of the target month.
fn paid_period(
    tier: SubscriptionTier,
    start: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), SubscriptionError> {
    let months = tier
        .period_months()
        .ok_or(SubscriptionError::NotAPaidTier(tier))?;

    let end = start
        .checked_add_months(Months::new(months))
        .ok_or(SubscriptionError::DateOutOfRange)?;

    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(y: i32, mo: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, 12, 0, 0).unwrap()
    }

    fn trial_state(start: DateTime<Utc>, end: DateTime<Utc>) -> SubscriptionState {
        SubscriptionState::trial(start, end)
    }

    #[test]
    fn test_days_until_rounds_up() {
        let end = at(2026, 3, 10);
        assert_eq!(days_until(end, at(2026, 3, 9)), 1);
        assert_eq!(days_until(end, end - Duration::hours(1)), 1);
        assert_eq!(days_until(end, end - Duration::days(3)), 3);
    }

    #[test]
    fn test_days_until_never_negative() {
        let end = at(2026, 3, 10);
        assert_eq!(days_until(end, end), 0);
        assert_eq!(days_until(end, end + Duration::days(2)), 0);
    }

    #[test]
    fn test_resolve_active_trial_unchanged() {
        let start = at(2026, 1, 1);
        let state = trial_state(start, start + Duration::days(30));

        let resolution = resolve(&state, start, start + Duration::days(10));
        let Resolution::Unchanged(window) = resolution else {
            panic!("no write expected for an active trial");
        };

        assert_eq!(window.status, SubscriptionStatus::Active);
        assert_eq!(window.days_remaining, 20);
    }

    #[test]
    fn test_resolve_expires_lapsed_trial_once() {
        let start = at(2026, 1, 1);
        let state = trial_state(start, start + Duration::days(30));

        let resolution = resolve(&state, start, start + Duration::days(31));
        let Resolution::Persist { state, window } = resolution else {
            panic!("expiry must persist");
        };
        assert_eq!(state.status, SubscriptionStatus::Expired);
        assert_eq!(window.days_remaining, 0);

        // Second resolution of the already-expired state writes nothing.
        let resolution = resolve(&state, start, start + Duration::days(32));
        assert!(matches!(resolution, Resolution::Unchanged(_)));
    }

    #[test]
    fn test_resolve_backfills_legacy_record() {
        let created = at(2026, 1, 1);
        let state = SubscriptionState {
            tier: None,
            status: SubscriptionStatus::Active,
            trial_started_at: None,
            trial_ends_at: None,
            subscription_started_at: None,
            subscription_ends_at: None,
        };

        let Resolution::Persist { state, .. } = resolve(&state, created, created) else {
            panic!("backfill must persist");
        };

        assert_eq!(state.tier, Some(SubscriptionTier::Trial));
        assert_eq!(state.trial_started_at, Some(created));
        assert_eq!(
            state.trial_ends_at,
            Some(created + Duration::days(TRIAL_PERIOD_DAYS))
        );
    }

    #[test]
    fn test_resolve_backfilled_stale_record_is_already_expired() {
        let created = at(2025, 1, 1);
        let state = SubscriptionState {
            tier: None,
            status: SubscriptionStatus::Active,
            trial_started_at: None,
            trial_ends_at: None,
            subscription_started_at: None,
            subscription_ends_at: None,
        };

        // Evaluated long after creation: the backfilled trial has lapsed.
        let Resolution::Persist { state, window } = resolve(&state, created, at(2026, 1, 1)) else {
            panic!("backfill must persist");
        };

        assert_eq!(state.status, SubscriptionStatus::Expired);
        assert_eq!(window.days_remaining, 0);
    }

    #[test]
    fn test_resolve_active_without_end_date_never_expires() {
        let state = SubscriptionState {
            tier: Some(SubscriptionTier::Monthly),
            status: SubscriptionStatus::Active,
            trial_started_at: None,
            trial_ends_at: None,
            subscription_started_at: Some(at(2020, 1, 1)),
            subscription_ends_at: None,
        };

        let resolution = resolve(&state, at(2020, 1, 1), at(2026, 1, 1));
        let Resolution::Unchanged(window) = resolution else {
            panic!("no end date means no expiry write");
        };
        assert_eq!(window.status, SubscriptionStatus::Active);
    }

    #[test]
    fn test_paid_period_lengths() {
        let start = at(2026, 3, 15);

        let (_, monthly) = paid_period(SubscriptionTier::Monthly, start).unwrap();
        assert_eq!(monthly, at(2026, 4, 15));

        let (_, quarterly) = paid_period(SubscriptionTier::Quarterly, start).unwrap();
        assert_eq!(quarterly, at(2026, 6, 15));

        let (_, yearly) = paid_period(SubscriptionTier::Yearly, start).unwrap();
        assert_eq!(yearly, at(2027, 3, 15));
    }

    #[test]
    fn test_paid_period_clamps_leap_day() {
        let start = at(2024, 2, 29);
        let (_, end) = paid_period(SubscriptionTier::Yearly, start).unwrap();
        assert_eq!(end, at(2025, 2, 28));
    }

    #[test]
    fn test_paid_period_clamps_month_end() {
        let start = at(2026, 1, 31);
        let (_, end) = paid_period(SubscriptionTier::Monthly, start).unwrap();
        assert_eq!(end, at(2026, 2, 28));
    }

    #[test]
    fn test_paid_period_rejects_trial() {
        assert!(matches!(
            paid_period(SubscriptionTier::Trial, at(2026, 1, 1)),
            Err(SubscriptionError::NotAPaidTier(_))
        ));
    }
}
