//! Account deletion orchestrator.
//!
//! Removes everything a tenant owns: customers, orders, and measurements
//! (with their blobs), notifications, the profile image, and finally the
//! tenant record itself. Blob deletions are best-effort and never abort the
//! cascade; record deletions are fatal on failure, with no compensating
//! rollback. Repeating the call on a partially deleted tenant is safe: all
//! record deletes are idempotent no-ops on already-absent data.
//!
//! Two entry points with different authorization:
//!
//! - [`AccountDeletion::delete_with_password`] verifies the tenant's
//!   password first.
//! - [`AccountDeletion::delete_by_phone`] accepts the phone alone, for the
//!   single click-through deletion flow. This reduced-authentication surface
//!   is a deliberate, accepted risk kept for behavior parity: anyone who
//!   knows a tenant's phone number can trigger deletion through it. Mount it
//!   accordingly.

use std::sync::Arc;

use stitchdesk_core::{Phone, TenantId};

use crate::db::{RepositoryError, Store};
use crate::models::Tenant;
use crate::services::auth;
use crate::services::blobs::{BlobStore, delete_best_effort};

/// Errors from account deletion.
#[derive(Debug, thiserror::Error)]
pub enum DeletionError {
    /// Tenant absent (or already deleted).
    #[error("account not found")]
    NotFound,

    /// Password mismatch on the protected entry point.
    #[error("invalid credentials")]
    Unauthorized,

    /// A record deletion failed; the cascade stopped without rollback.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// The account deletion orchestrator.
#[derive(Clone)]
pub struct AccountDeletion {
    store: Store,
    blobs: Arc<dyn BlobStore>,
}

impl AccountDeletion {
    /// Create a new deletion orchestrator.
    #[must_use]
    pub fn new(store: Store, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Delete the account behind `phone` after verifying `password`.
    ///
    /// # Errors
    ///
    /// Returns [`DeletionError::NotFound`] if no such tenant exists,
    /// [`DeletionError::Unauthorized`] on password mismatch, or a repository
    /// error if a record deletion fails.
    pub async fn delete_with_password(
        &self,
        phone: &Phone,
        password: &str,
    ) -> Result<(), DeletionError> {
        let tenant = self
            .store
            .tenants
            .find_by_phone(phone)
            .await?
            .ok_or(DeletionError::NotFound)?;

        if !auth::password_matches(password, &tenant.password_hash) {
            return Err(DeletionError::Unauthorized);
        }

        self.run(&tenant).await
    }

    /// Delete the account behind `phone` with no credential check.
    ///
    /// Reduced-authentication entry point; see the module docs for the
    /// accepted risk.
    ///
    /// # Errors
    ///
    /// Returns [`DeletionError::NotFound`] if no such tenant exists, or a
    /// repository error if a record deletion fails.
    pub async fn delete_by_phone(&self, phone: &Phone) -> Result<(), DeletionError> {
        let tenant = self
            .store
            .tenants
            .find_by_phone(phone)
            .await?
            .ok_or(DeletionError::NotFound)?;

        self.run(&tenant).await
    }

    /// Delete the account behind `tenant_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DeletionError::NotFound`] if no such tenant exists, or a
    /// repository error if a record deletion fails.
    pub async fn delete_account(&self, tenant_id: TenantId) -> Result<(), DeletionError> {
        let tenant = self
            .store
            .tenants
            .find_by_id(tenant_id)
            .await?
            .ok_or(DeletionError::NotFound)?;

        self.run(&tenant).await
    }

    async fn run(&self, tenant: &Tenant) -> Result<(), DeletionError> {
        let tenant_id = tenant.id;

        // Customers and their photos.
        let customers = self.store.customers.list(tenant_id).await?;
        for customer in &customers {
            if let Some(photo) = &customer.photo {
                delete_best_effort(self.blobs.as_ref(), photo).await;
            }
        }
        let removed = self.store.customers.delete_all(tenant_id).await?;
        tracing::debug!(tenant = %tenant_id, removed, "customers deleted");

        // Orders and their style pictures / sketches.
        let orders = self.store.orders.list(tenant_id).await?;
        for order in &orders {
            for picture in order.style_pictures.iter().chain(order.sketches.iter()) {
                delete_best_effort(self.blobs.as_ref(), picture).await;
            }
        }
        let removed = self.store.orders.delete_all(tenant_id).await?;
        tracing::debug!(tenant = %tenant_id, removed, "orders deleted");

        // Measurements and their photos.
        let measurements = self.store.measurements.list(tenant_id).await?;
        for measurement in &measurements {
            if let Some(photo) = &measurement.photo {
                delete_best_effort(self.blobs.as_ref(), photo).await;
            }
        }
        let removed = self.store.measurements.delete_all(tenant_id).await?;
        tracing::debug!(tenant = %tenant_id, removed, "measurements deleted");

        // Notifications.
        let removed = self.store.notifications.delete_all(tenant_id).await?;
        tracing::debug!(tenant = %tenant_id, removed, "notifications deleted");

        // Profile image.
        if let Some(image) = &tenant.profile_image {
            delete_best_effort(self.blobs.as_ref(), image).await;
        }

        // The tenant itself. A concurrent deletion racing us to this point
        // leaves nothing to do.
        if !self.store.tenants.delete(tenant_id).await? {
            tracing::debug!(tenant = %tenant_id, "tenant row already gone");
        }

        tracing::info!(tenant = %tenant_id, "account deleted");
        Ok(())
    }
}
