//! Account deletion cascade against the in-memory store.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};

use stitchdesk_api::models::{NewCustomer, NewMeasurement, NewNotification, NewOrder};
use stitchdesk_api::services::{AccountDeletion, AuthService, DeletionError};
use stitchdesk_core::NotificationKind;

use common::{FakeBlobStore, blob, seed_tenant, store, trial_state};

fn new_customer(name: &str) -> NewCustomer {
    NewCustomer {
        name: name.to_owned(),
        phone: None,
        email: None,
        address: None,
        notes: None,
    }
}

fn new_order(title: &str) -> NewOrder {
    NewOrder {
        customer_id: None,
        title: title.to_owned(),
        description: None,
        due_date: None,
        charge: None,
    }
}

fn new_measurement(label: &str) -> NewMeasurement {
    NewMeasurement {
        customer_id: None,
        label: label.to_owned(),
        values: std::collections::BTreeMap::new(),
        unit: "in".to_owned(),
        notes: None,
    }
}

#[tokio::test]
async fn cascade_removes_every_record_and_blob() {
    let store = store();
    let blobs = Arc::new(FakeBlobStore::new());
    let deletion = AccountDeletion::new(store.clone(), blobs.clone());

    let now = Utc::now();
    let tenant = seed_tenant(&store, 1, trial_state(now, now + Duration::days(30))).await;

    // Customer with a photo.
    let customer = store
        .customers
        .create(tenant.id, new_customer("Ada"))
        .await
        .unwrap();
    store
        .customers
        .set_photo(tenant.id, customer.id, Some(&blob("customers/ada")))
        .await
        .unwrap();

    // Order with a style picture and a sketch.
    let order = store.orders.create(tenant.id, new_order("Suit")).await.unwrap();
    store
        .orders
        .add_style_picture(tenant.id, order.id, &blob("styles/suit"))
        .await
        .unwrap();
    store
        .orders
        .add_sketch(tenant.id, order.id, &blob("sketches/suit"))
        .await
        .unwrap();

    // Measurement with a photo.
    let measurement = store
        .measurements
        .create(tenant.id, new_measurement("Wedding fit"))
        .await
        .unwrap();
    store
        .measurements
        .set_photo(tenant.id, measurement.id, Some(&blob("measurements/fit")))
        .await
        .unwrap();

    // A notification and a profile image.
    store
        .notifications
        .create(NewNotification {
            tenant_id: tenant.id,
            title: "Welcome".to_owned(),
            body: "Your trial has started".to_owned(),
            kind: NotificationKind::General,
        })
        .await
        .unwrap();
    store
        .tenants
        .set_profile_image(tenant.id, Some(&blob("profiles/me")))
        .await
        .unwrap();

    deletion.delete_account(tenant.id).await.unwrap();

    assert!(store.tenants.find_by_id(tenant.id).await.unwrap().is_none());
    assert!(store.customers.list(tenant.id).await.unwrap().is_empty());
    assert!(store.orders.list(tenant.id).await.unwrap().is_empty());
    assert!(store.measurements.list(tenant.id).await.unwrap().is_empty());
    assert!(store.notifications.list(tenant.id).await.unwrap().is_empty());

    let mut deleted = blobs.deleted_keys();
    deleted.sort();
    assert_eq!(
        deleted,
        vec![
            "customers/ada",
            "measurements/fit",
            "profiles/me",
            "sketches/suit",
            "styles/suit",
        ]
    );
}

#[tokio::test]
async fn blob_failures_never_abort_the_cascade() {
    let store = store();
    let blobs = Arc::new(FakeBlobStore::failing_deletes());
    let deletion = AccountDeletion::new(store.clone(), blobs);

    let now = Utc::now();
    let tenant = seed_tenant(&store, 1, trial_state(now, now + Duration::days(30))).await;

    let customer = store
        .customers
        .create(tenant.id, new_customer("Bisi"))
        .await
        .unwrap();
    store
        .customers
        .set_photo(tenant.id, customer.id, Some(&blob("customers/bisi")))
        .await
        .unwrap();
    store
        .tenants
        .set_profile_image(tenant.id, Some(&blob("profiles/bisi")))
        .await
        .unwrap();

    // Every blob deletion fails; the account deletion must still succeed.
    deletion.delete_account(tenant.id).await.unwrap();

    assert!(store.tenants.find_by_id(tenant.id).await.unwrap().is_none());
    assert!(store.customers.list(tenant.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn second_deletion_reports_not_found() {
    let store = store();
    let deletion = AccountDeletion::new(store.clone(), Arc::new(FakeBlobStore::new()));

    let now = Utc::now();
    let tenant = seed_tenant(&store, 1, trial_state(now, now + Duration::days(30))).await;

    deletion.delete_account(tenant.id).await.unwrap();

    assert!(matches!(
        deletion.delete_account(tenant.id).await,
        Err(DeletionError::NotFound)
    ));
}

#[tokio::test]
async fn password_entry_point_rejects_wrong_credential() {
    let store = store();
    let auth = AuthService::new(store.tenants.clone());
    let deletion = AccountDeletion::new(store.clone(), Arc::new(FakeBlobStore::new()));

    let tenant = auth
        .signup(&common::phone(7), "sew-and-sew-9", "Needleworks", Utc::now())
        .await
        .unwrap();

    assert!(matches!(
        deletion
            .delete_with_password(&tenant.phone, "wrong password")
            .await,
        Err(DeletionError::Unauthorized)
    ));
    // Nothing was deleted.
    assert!(store.tenants.find_by_id(tenant.id).await.unwrap().is_some());

    deletion
        .delete_with_password(&tenant.phone, "sew-and-sew-9")
        .await
        .unwrap();
    assert!(store.tenants.find_by_id(tenant.id).await.unwrap().is_none());
}

#[tokio::test]
async fn phone_only_entry_point_needs_no_credential() {
    let store = store();
    let auth = AuthService::new(store.tenants.clone());
    let deletion = AccountDeletion::new(store.clone(), Arc::new(FakeBlobStore::new()));

    let tenant = auth
        .signup(&common::phone(8), "sew-and-sew-9", "Needleworks", Utc::now())
        .await
        .unwrap();

    deletion.delete_by_phone(&tenant.phone).await.unwrap();
    assert!(store.tenants.find_by_id(tenant.id).await.unwrap().is_none());
}
