//! Broadcast targeting and dispatch against the in-memory store.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use stitchdesk_api::services::Broadcaster;
use stitchdesk_core::{BroadcastCriterion, NotificationKind, SubscriptionTier, TenantId};

use common::{FakePush, expired, paid_state, seed_admin, seed_tenant, store, trial_state};

fn ids(tenants: &[stitchdesk_api::models::Tenant]) -> Vec<TenantId> {
    tenants.iter().map(|t| t.id).collect()
}

#[tokio::test]
async fn expiring_soon_uses_a_seven_day_window() {
    let store = store();
    let broadcaster = Broadcaster::new(
        store.tenants.clone(),
        store.notifications.clone(),
        Arc::new(FakePush::new()),
    );

    let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();

    // Paid window ending in 3 days: included.
    let soon = seed_tenant(
        &store,
        1,
        paid_state(
            SubscriptionTier::Monthly,
            now - Duration::days(27),
            now + Duration::days(3),
        ),
    )
    .await;
    // Paid window ending in 10 days: excluded.
    seed_tenant(
        &store,
        2,
        paid_state(
            SubscriptionTier::Monthly,
            now - Duration::days(20),
            now + Duration::days(10),
        ),
    )
    .await;
    // Trial ending in 6 days: included (trial end date counts too).
    let trial_soon = seed_tenant(
        &store,
        3,
        trial_state(now - Duration::days(24), now + Duration::days(6)),
    )
    .await;

    let targets = broadcaster
        .select_targets(BroadcastCriterion::ExpiringSoon, now)
        .await
        .unwrap();

    assert_eq!(ids(&targets), vec![soon.id, trial_soon.id]);
}

#[tokio::test]
async fn expired_unions_stored_and_lazily_expired() {
    let store = store();
    let broadcaster = Broadcaster::new(
        store.tenants.clone(),
        store.notifications.clone(),
        Arc::new(FakePush::new()),
    );

    let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();

    // Stored as expired.
    let swept = seed_tenant(
        &store,
        1,
        expired(trial_state(now - Duration::days(60), now - Duration::days(30))),
    )
    .await;
    // Still stored active, but the window lapsed: not yet swept by a status
    // query, must be included anyway.
    let lazy = seed_tenant(
        &store,
        2,
        paid_state(
            SubscriptionTier::Monthly,
            now - Duration::days(40),
            now - Duration::days(2),
        ),
    )
    .await;
    // Healthy active tenant: excluded.
    seed_tenant(
        &store,
        3,
        trial_state(now - Duration::days(1), now + Duration::days(29)),
    )
    .await;

    let targets = broadcaster
        .select_targets(BroadcastCriterion::Expired, now)
        .await
        .unwrap();

    assert_eq!(ids(&targets), vec![swept.id, lazy.id]);
}

#[tokio::test]
async fn trial_user_typo_selects_the_same_set_as_trial_users() {
    let store = store();
    let broadcaster = Broadcaster::new(
        store.tenants.clone(),
        store.notifications.clone(),
        Arc::new(FakePush::new()),
    );

    let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();

    seed_tenant(
        &store,
        1,
        trial_state(now - Duration::days(5), now + Duration::days(25)),
    )
    .await;
    seed_tenant(
        &store,
        2,
        expired(trial_state(now - Duration::days(60), now - Duration::days(30))),
    )
    .await;
    seed_tenant(
        &store,
        3,
        paid_state(
            SubscriptionTier::Yearly,
            now - Duration::days(10),
            now + Duration::days(355),
        ),
    )
    .await;

    let canonical = broadcaster
        .select_targets(BroadcastCriterion::parse(Some("trial_users")), now)
        .await
        .unwrap();
    let typo = broadcaster
        .select_targets(BroadcastCriterion::parse(Some("trial_user")), now)
        .await
        .unwrap();

    assert_eq!(ids(&canonical), ids(&typo));
    assert_eq!(canonical.len(), 1);
}

#[tokio::test]
async fn unknown_criterion_targets_all_non_admin_tenants() {
    let store = store();
    let broadcaster = Broadcaster::new(
        store.tenants.clone(),
        store.notifications.clone(),
        Arc::new(FakePush::new()),
    );

    let now = Utc::now();
    let a = seed_tenant(&store, 1, trial_state(now, now + Duration::days(30))).await;
    let b = seed_tenant(
        &store,
        2,
        expired(trial_state(now - Duration::days(60), now - Duration::days(30))),
    )
    .await;
    // Admins are never targeted, whatever the criterion.
    seed_admin(&store, 9, trial_state(now, now + Duration::days(30))).await;

    let targets = broadcaster
        .select_targets(BroadcastCriterion::parse(Some("everyone")), now)
        .await
        .unwrap();

    assert_eq!(ids(&targets), vec![a.id, b.id]);
}

#[tokio::test]
async fn broadcast_persists_notifications_and_pushes_to_opted_in_subset() {
    let store = store();
    let push = Arc::new(FakePush::new());
    let broadcaster = Broadcaster::new(store.tenants.clone(), store.notifications.clone(), push.clone());

    let now = Utc::now();
    let with_token = seed_tenant(&store, 1, trial_state(now, now + Duration::days(30))).await;
    store
        .tenants
        .set_push_registration(with_token.id, true, Some("token-1"))
        .await
        .unwrap();
    // Opted in but never registered a token: no push.
    let without_token = seed_tenant(&store, 2, trial_state(now, now + Duration::days(30))).await;
    store
        .tenants
        .set_push_registration(without_token.id, true, None)
        .await
        .unwrap();
    // Opted out entirely.
    let opted_out = seed_tenant(&store, 3, trial_state(now, now + Duration::days(30))).await;

    let outcome = broadcaster
        .broadcast(
            BroadcastCriterion::TrialUsers,
            "Trial tips",
            "Measure twice, cut once.",
            now,
        )
        .await
        .unwrap();

    assert_eq!(outcome.notified_count, 3);
    assert_eq!(outcome.push_success, 1);
    assert_eq!(outcome.push_failed, 0);

    // Every target got a persisted, unread notification of the resolved kind.
    for tenant in [&with_token, &without_token, &opted_out] {
        let notifications = store.notifications.list(tenant.id).await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert!(!notifications[0].read);
        assert_eq!(notifications[0].kind, NotificationKind::Subscription);
    }

    let batches = push.batches.lock().unwrap();
    assert_eq!(batches.as_slice(), &[vec!["token-1".to_owned()]]);
}

#[tokio::test]
async fn push_failure_never_rolls_back_notifications() {
    let store = store();
    let broadcaster = Broadcaster::new(
        store.tenants.clone(),
        store.notifications.clone(),
        Arc::new(FakePush::failing()),
    );

    let now = Utc::now();
    let tenant = seed_tenant(&store, 1, trial_state(now, now + Duration::days(30))).await;
    store
        .tenants
        .set_push_registration(tenant.id, true, Some("token-1"))
        .await
        .unwrap();

    let outcome = broadcaster
        .broadcast(BroadcastCriterion::All, "Maintenance", "Back at noon.", now)
        .await
        .unwrap();

    assert_eq!(outcome.notified_count, 1);
    assert_eq!(outcome.push_success, 0);
    assert_eq!(outcome.push_failed, 1);

    // The persisted notification survives the failed dispatch.
    let notifications = store.notifications.list(tenant.id).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::General);
}
