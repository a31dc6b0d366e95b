//! Subscription lifecycle behavior against the in-memory store.

#![allow(clippy::unwrap_used)]

mod common;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use stitchdesk_api::services::SubscriptionService;
use stitchdesk_api::services::payments::VerifiedTransaction;
use stitchdesk_core::{PaymentStatus, SubscriptionStatus, SubscriptionTier};

use common::{paid_state, seed_tenant, store, trial_state};

fn tx(reference: &str) -> VerifiedTransaction {
    VerifiedTransaction {
        tx_ref: reference.to_owned(),
        status: PaymentStatus::Successful,
        amount: Decimal::from(5_000_u32),
        currency: "NGN".to_owned(),
    }
}

#[tokio::test]
async fn status_query_reports_expiry_after_trial_window() {
    let store = store();
    let service = SubscriptionService::new(store.tenants.clone());

    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
    let tenant = seed_tenant(&store, 1, trial_state(t0, t0 + Duration::days(30))).await;

    // 31 days in, the trial has lapsed.
    let window = service
        .evaluate(&tenant, t0 + Duration::days(31))
        .await
        .unwrap();

    assert_eq!(window.status, SubscriptionStatus::Expired);
    assert_eq!(window.days_remaining, 0);

    // The transition was persisted.
    let stored = store.tenants.find_by_id(tenant.id).await.unwrap().unwrap();
    assert_eq!(stored.subscription.status, SubscriptionStatus::Expired);
}

#[tokio::test]
async fn status_query_before_trial_end_stays_active() {
    let store = store();
    let service = SubscriptionService::new(store.tenants.clone());

    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
    let tenant = seed_tenant(&store, 1, trial_state(t0, t0 + Duration::days(30))).await;

    let window = service
        .evaluate(&tenant, t0 + Duration::days(29))
        .await
        .unwrap();

    assert_eq!(window.status, SubscriptionStatus::Active);
    assert!(window.days_remaining >= 1);
}

#[tokio::test]
async fn repeated_evaluation_writes_only_once() {
    let store = store();
    let service = SubscriptionService::new(store.tenants.clone());

    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
    let tenant = seed_tenant(&store, 1, trial_state(t0, t0 + Duration::days(30))).await;

    service
        .evaluate(&tenant, t0 + Duration::days(31))
        .await
        .unwrap();
    let after_first = store.tenants.find_by_id(tenant.id).await.unwrap().unwrap();

    // Evaluating the already-expired tenant again must not touch the row.
    let window = service
        .evaluate(&after_first, t0 + Duration::days(40))
        .await
        .unwrap();
    assert_eq!(window.status, SubscriptionStatus::Expired);

    let after_second = store.tenants.find_by_id(tenant.id).await.unwrap().unwrap();
    assert_eq!(after_first.updated_at, after_second.updated_at);
}

#[tokio::test]
async fn payment_moves_expired_trial_to_active_paid() {
    let store = store();
    let service = SubscriptionService::new(store.tenants.clone());

    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
    let tenant = seed_tenant(&store, 1, trial_state(t0, t0 + Duration::days(30))).await;

    let now = t0 + Duration::days(45);
    service
        .evaluate(&tenant, now)
        .await
        .unwrap();
    let tenant = store.tenants.find_by_id(tenant.id).await.unwrap().unwrap();
    assert_eq!(tenant.subscription.status, SubscriptionStatus::Expired);

    service
        .apply_payment(&tenant, SubscriptionTier::Monthly, &tx("fw-001"), now)
        .await
        .unwrap();

    let stored = store.tenants.find_by_id(tenant.id).await.unwrap().unwrap();
    assert_eq!(stored.subscription.status, SubscriptionStatus::Active);
    assert_eq!(stored.subscription.tier, Some(SubscriptionTier::Monthly));
    // Trial dates cleared, paid dates set: the pairs are mutually exclusive.
    assert!(stored.subscription.trial_started_at.is_none());
    assert!(stored.subscription.trial_ends_at.is_none());
    assert_eq!(stored.subscription.subscription_started_at, Some(now));
    assert_eq!(stored.payment_history.len(), 1);
}

#[tokio::test]
async fn payment_is_idempotent_per_reference() {
    let store = store();
    let service = SubscriptionService::new(store.tenants.clone());

    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
    let tenant = seed_tenant(&store, 1, trial_state(t0, t0 + Duration::days(30))).await;

    let now = t0 + Duration::days(10);
    service
        .apply_payment(&tenant, SubscriptionTier::Quarterly, &tx("fw-dup"), now)
        .await
        .unwrap();

    let after_first = store.tenants.find_by_id(tenant.id).await.unwrap().unwrap();

    // A second confirmation callback for the same reference changes nothing.
    service
        .apply_payment(
            &after_first,
            SubscriptionTier::Quarterly,
            &tx("fw-dup"),
            now + Duration::days(1),
        )
        .await
        .unwrap();

    let after_second = store.tenants.find_by_id(tenant.id).await.unwrap().unwrap();
    assert_eq!(after_second.payment_history.len(), 1);
    assert_eq!(
        after_first.subscription.subscription_ends_at,
        after_second.subscription.subscription_ends_at
    );
}

#[tokio::test]
async fn yearly_payment_on_leap_day_clamps_to_feb_28() {
    let store = store();
    let service = SubscriptionService::new(store.tenants.clone());

    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let tenant = seed_tenant(&store, 1, trial_state(t0, t0 + Duration::days(30))).await;

    let leap_day = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
    service
        .apply_payment(&tenant, SubscriptionTier::Yearly, &tx("fw-leap"), leap_day)
        .await
        .unwrap();

    let stored = store.tenants.find_by_id(tenant.id).await.unwrap().unwrap();
    assert_eq!(
        stored.subscription.subscription_ends_at,
        Some(Utc.with_ymd_and_hms(2025, 2, 28, 12, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn paid_window_expires_lazily_like_trial() {
    let store = store();
    let service = SubscriptionService::new(store.tenants.clone());

    let start = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();
    let tenant = seed_tenant(&store, 1, paid_state(SubscriptionTier::Monthly, start, end)).await;

    let window = service
        .evaluate(&tenant, end + Duration::days(1))
        .await
        .unwrap();

    assert_eq!(window.status, SubscriptionStatus::Expired);
    assert_eq!(window.days_remaining, 0);
}

#[tokio::test]
async fn admin_override_accepts_explicit_dates() {
    let store = store();
    let service = SubscriptionService::new(store.tenants.clone());

    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
    let tenant = seed_tenant(&store, 1, trial_state(t0, t0 + Duration::days(30))).await;

    let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap();
    service
        .change_tier(
            &tenant,
            SubscriptionTier::Quarterly,
            Some(start),
            Some(end),
            t0,
        )
        .await
        .unwrap();

    let stored = store.tenants.find_by_id(tenant.id).await.unwrap().unwrap();
    assert_eq!(stored.subscription.tier, Some(SubscriptionTier::Quarterly));
    assert_eq!(stored.subscription.subscription_started_at, Some(start));
    assert_eq!(stored.subscription.subscription_ends_at, Some(end));
    // No settled transaction backs an override.
    assert!(stored.payment_history.is_empty());
}
