//! Shared fixtures for the integration suites.
//!
//! Everything runs against the in-memory store with scripted collaborator
//! fakes; no database or network is involved.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use stitchdesk_api::db::Store;
use stitchdesk_api::models::{NewTenant, SubscriptionState, Tenant};
use stitchdesk_api::services::{BlobError, BlobStore, PushError, PushReceipt, PushSender};
use stitchdesk_core::{BlobRef, Phone, SubscriptionStatus, SubscriptionTier};

/// A fresh in-memory store.
pub fn store() -> Store {
    Store::in_memory()
}

/// An 11-digit phone number unique per `n`.
pub fn phone(n: u64) -> String {
    format!("080{n:08}")
}

/// Seed a tenant with the given subscription state.
pub async fn seed_tenant(store: &Store, n: u64, state: SubscriptionState) -> Tenant {
    store
        .tenants
        .create(NewTenant {
            phone: Phone::parse(&phone(n)).unwrap(),
            password_hash: "$argon2id$fixture".to_owned(),
            business_name: format!("Shop {n}"),
            is_admin: false,
            subscription: state,
        })
        .await
        .unwrap()
}

/// Seed an admin tenant.
pub async fn seed_admin(store: &Store, n: u64, state: SubscriptionState) -> Tenant {
    store
        .tenants
        .create(NewTenant {
            phone: Phone::parse(&phone(n)).unwrap(),
            password_hash: "$argon2id$fixture".to_owned(),
            business_name: format!("Admin {n}"),
            is_admin: true,
            subscription: state,
        })
        .await
        .unwrap()
}

/// An active trial window.
pub fn trial_state(start: DateTime<Utc>, end: DateTime<Utc>) -> SubscriptionState {
    SubscriptionState::trial(start, end)
}

/// An active paid window.
pub fn paid_state(
    tier: SubscriptionTier,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> SubscriptionState {
    SubscriptionState::paid(tier, start, end)
}

/// A window whose stored status is already expired.
pub fn expired(mut state: SubscriptionState) -> SubscriptionState {
    state.status = SubscriptionStatus::Expired;
    state
}

/// Blob store fake: records uploads and deletions, optionally failing every
/// deletion.
pub struct FakeBlobStore {
    pub uploads: Mutex<Vec<BlobRef>>,
    pub deleted: Mutex<Vec<String>>,
    fail_deletes: AtomicBool,
}

impl FakeBlobStore {
    pub fn new() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            fail_deletes: AtomicBool::new(false),
        }
    }

    /// A fake whose every deletion fails.
    pub fn failing_deletes() -> Self {
        let fake = Self::new();
        fake.fail_deletes.store(true, Ordering::SeqCst);
        fake
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn put(
        &self,
        _bytes: Vec<u8>,
        logical_path: &str,
        _content_type: &str,
    ) -> Result<BlobRef, BlobError> {
        let key = format!("{logical_path}/{}", Uuid::new_v4());
        let blob = BlobRef::new(key.clone(), format!("https://blobs.test/{key}"));
        self.uploads.lock().unwrap().push(blob.clone());
        Ok(blob)
    }

    async fn delete(&self, blob: &BlobRef) -> Result<(), BlobError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BlobError::Api {
                status: 500,
                message: "storage offline".to_owned(),
            });
        }
        self.deleted.lock().unwrap().push(blob.key.clone());
        Ok(())
    }
}

/// A blob reference as the store would have produced it.
pub fn blob(key: &str) -> BlobRef {
    BlobRef::new(key.to_owned(), format!("https://blobs.test/{key}"))
}

/// Push fake: records each batch, optionally failing wholesale.
pub struct FakePush {
    pub batches: Mutex<Vec<Vec<String>>>,
    fail: bool,
}

impl FakePush {
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl PushSender for FakePush {
    async fn send(
        &self,
        tokens: &[String],
        _title: &str,
        _body: &str,
        _data: &serde_json::Value,
    ) -> Result<PushReceipt, PushError> {
        if self.fail {
            return Err(PushError::Api {
                status: 503,
                message: "dispatch offline".to_owned(),
            });
        }

        self.batches.lock().unwrap().push(tokens.to_vec());
        Ok(PushReceipt {
            success_count: u32::try_from(tokens.len()).unwrap(),
            failure_count: 0,
        })
    }
}
