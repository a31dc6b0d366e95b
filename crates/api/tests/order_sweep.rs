//! Periodic order sweep against the in-memory store.

#![allow(clippy::unwrap_used)]

mod common;

use chrono::{Duration, Utc};

use stitchdesk_api::models::{NewOrder, OrderUpdate};
use stitchdesk_api::services::OrderSweep;
use stitchdesk_core::{NotificationKind, OrderStatus};

use common::{seed_tenant, store, trial_state};

fn new_order(title: &str) -> NewOrder {
    NewOrder {
        customer_id: None,
        title: title.to_owned(),
        description: None,
        due_date: None,
        charge: None,
    }
}

#[tokio::test]
async fn stale_pending_orders_are_promoted_with_reminders() {
    let store = store();
    let sweep = OrderSweep::new(store.orders.clone(), store.notifications.clone());

    let now = Utc::now();
    let tenant = seed_tenant(&store, 1, trial_state(now, now + Duration::days(30))).await;

    let stale = store.orders.create(tenant.id, new_order("Agbada")).await.unwrap();
    store.orders.create(tenant.id, new_order("Kaftan")).await.unwrap();
    // Already in progress; the sweep must not touch it.
    let moving = store.orders.create(tenant.id, new_order("Suit")).await.unwrap();
    store
        .orders
        .update(
            tenant.id,
            moving.id,
            OrderUpdate {
                status: Some(OrderStatus::InProgress),
                ..OrderUpdate::default()
            },
        )
        .await
        .unwrap();

    // Run the sweep as if three days have passed: both pending orders are
    // past the two-day threshold.
    let promoted = sweep.run_once(now + Duration::days(3)).await.unwrap();
    assert_eq!(promoted, 2);

    let stale_after = store.orders.find(tenant.id, stale.id).await.unwrap().unwrap();
    assert_eq!(stale_after.status, OrderStatus::InProgress);

    let moving_after = store.orders.find(tenant.id, moving.id).await.unwrap().unwrap();
    assert_eq!(moving_after.status, OrderStatus::InProgress);

    // One delivery reminder per promoted order.
    let notifications = store.notifications.list(tenant.id).await.unwrap();
    assert_eq!(notifications.len(), 2);
    assert!(
        notifications
            .iter()
            .all(|n| n.kind == NotificationKind::Delivery)
    );
}

#[tokio::test]
async fn fresh_pending_orders_are_left_alone() {
    let store = store();
    let sweep = OrderSweep::new(store.orders.clone(), store.notifications.clone());

    let now = Utc::now();
    let tenant = seed_tenant(&store, 1, trial_state(now, now + Duration::days(30))).await;
    let order = store.orders.create(tenant.id, new_order("Blazer")).await.unwrap();

    // One day later the order is under the two-day threshold.
    let promoted = sweep.run_once(now + Duration::days(1)).await.unwrap();
    assert_eq!(promoted, 0);

    let after = store.orders.find(tenant.id, order.id).await.unwrap().unwrap();
    assert_eq!(after.status, OrderStatus::Pending);
    assert!(store.notifications.list(tenant.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn sweep_is_idempotent_across_runs() {
    let store = store();
    let sweep = OrderSweep::new(store.orders.clone(), store.notifications.clone());

    let now = Utc::now();
    let tenant = seed_tenant(&store, 1, trial_state(now, now + Duration::days(30))).await;
    store.orders.create(tenant.id, new_order("Agbada")).await.unwrap();

    let clock = now + Duration::days(3);
    assert_eq!(sweep.run_once(clock).await.unwrap(), 1);
    // Nothing pending remains, so the second pass is a no-op.
    assert_eq!(sweep.run_once(clock).await.unwrap(), 0);

    let notifications = store.notifications.list(tenant.id).await.unwrap();
    assert_eq!(notifications.len(), 1);
}
