//! Ownership invariant: tenant-scoped reads and writes filter by
//! `(id, tenant_id)` jointly, and a mismatch reads as absent - never as
//! forbidden.

#![allow(clippy::unwrap_used)]

mod common;

use chrono::{Duration, Utc};

use stitchdesk_api::models::{CustomerUpdate, NewCustomer, NewNotification, NewOrder, OrderUpdate};
use stitchdesk_core::NotificationKind;

use common::{blob, seed_tenant, store, trial_state};

#[tokio::test]
async fn customer_operations_under_the_wrong_tenant_read_as_absent() {
    let store = store();
    let now = Utc::now();
    let owner = seed_tenant(&store, 1, trial_state(now, now + Duration::days(30))).await;
    let intruder = seed_tenant(&store, 2, trial_state(now, now + Duration::days(30))).await;

    let customer = store
        .customers
        .create(
            owner.id,
            NewCustomer {
                name: "Ada".to_owned(),
                phone: None,
                email: None,
                address: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    // Fetch, update, photo, and delete under the wrong tenant all read as
    // "no such record".
    assert!(
        store
            .customers
            .find(intruder.id, customer.id)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        store
            .customers
            .update(
                intruder.id,
                customer.id,
                CustomerUpdate {
                    name: Some("Mallory".to_owned()),
                    ..CustomerUpdate::default()
                },
            )
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        !store
            .customers
            .set_photo(intruder.id, customer.id, Some(&blob("customers/x")))
            .await
            .unwrap()
    );
    assert!(
        store
            .customers
            .delete(intruder.id, customer.id)
            .await
            .unwrap()
            .is_none()
    );

    // The record is untouched for its owner.
    let intact = store
        .customers
        .find(owner.id, customer.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(intact.name, "Ada");
    assert!(intact.photo.is_none());
}

#[tokio::test]
async fn order_operations_under_the_wrong_tenant_read_as_absent() {
    let store = store();
    let now = Utc::now();
    let owner = seed_tenant(&store, 1, trial_state(now, now + Duration::days(30))).await;
    let intruder = seed_tenant(&store, 2, trial_state(now, now + Duration::days(30))).await;

    let order = store
        .orders
        .create(
            owner.id,
            NewOrder {
                customer_id: None,
                title: "Suit".to_owned(),
                description: None,
                due_date: None,
                charge: None,
            },
        )
        .await
        .unwrap();

    assert!(store.orders.find(intruder.id, order.id).await.unwrap().is_none());
    assert!(
        store
            .orders
            .update(intruder.id, order.id, OrderUpdate::default())
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        !store
            .orders
            .add_style_picture(intruder.id, order.id, &blob("styles/x"))
            .await
            .unwrap()
    );
    assert!(store.orders.delete(intruder.id, order.id).await.unwrap().is_none());

    assert!(store.orders.find(owner.id, order.id).await.unwrap().is_some());
}

#[tokio::test]
async fn notifications_are_invisible_across_tenants() {
    let store = store();
    let now = Utc::now();
    let owner = seed_tenant(&store, 1, trial_state(now, now + Duration::days(30))).await;
    let intruder = seed_tenant(&store, 2, trial_state(now, now + Duration::days(30))).await;

    let notification = store
        .notifications
        .create(NewNotification {
            tenant_id: owner.id,
            title: "Hello".to_owned(),
            body: "A note".to_owned(),
            kind: NotificationKind::General,
        })
        .await
        .unwrap();

    assert!(store.notifications.list(intruder.id).await.unwrap().is_empty());
    assert!(
        !store
            .notifications
            .mark_read(intruder.id, notification.id)
            .await
            .unwrap()
    );

    let owned = store.notifications.list(owner.id).await.unwrap();
    assert_eq!(owned.len(), 1);
    assert!(!owned[0].read);
}
