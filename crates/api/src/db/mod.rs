//! Data store: traits, errors, and implementations.
//!
//! The store is an explicitly constructed dependency threaded through the
//! services, never process-global state. Two implementations exist:
//!
//! - [`postgres`] - `PostgreSQL` repositories over a connection pool; the
//!   production store.
//! - [`memory`] - a deterministic in-memory store for tests and local
//!   development without a database.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p stitchdesk-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use stitchdesk_core::{BlobRef, CustomerId, MeasurementId, NotificationId, OrderId, Phone, TenantId};

use crate::models::{
    Customer, CustomerUpdate, Measurement, MeasurementUpdate, NewCustomer, NewMeasurement,
    NewNotification, NewOrder, NewTenant, Notification, Order, OrderUpdate, PaymentRecord,
    PendingPayment, SubscriptionState, Tenant,
};

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Errors surfaced by store operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Record not found (or not owned by the caller - indistinguishable).
    #[error("record not found")]
    NotFound,

    /// Unique constraint violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Stored data failed to parse back into domain types.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Store operations on tenants.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Create a tenant.
    ///
    /// Fails with [`RepositoryError::Conflict`] if the phone is taken.
    async fn create(&self, new: NewTenant) -> Result<Tenant, RepositoryError>;

    async fn find_by_id(&self, id: TenantId) -> Result<Option<Tenant>, RepositoryError>;

    async fn find_by_phone(&self, phone: &Phone) -> Result<Option<Tenant>, RepositoryError>;

    /// All non-admin tenants, oldest first.
    async fn list_non_admin(&self) -> Result<Vec<Tenant>, RepositoryError>;

    /// Overwrite the persisted subscription state.
    async fn update_subscription(
        &self,
        id: TenantId,
        state: &SubscriptionState,
    ) -> Result<(), RepositoryError>;

    /// Set or clear the in-flight payment marker.
    async fn set_pending_payment(
        &self,
        id: TenantId,
        pending: Option<&PendingPayment>,
    ) -> Result<(), RepositoryError>;

    /// Append a settled payment, apply the new subscription state, and clear
    /// the pending marker in a single document update.
    async fn record_payment(
        &self,
        id: TenantId,
        record: &PaymentRecord,
        state: &SubscriptionState,
    ) -> Result<(), RepositoryError>;

    async fn update_business_name(
        &self,
        id: TenantId,
        business_name: &str,
    ) -> Result<(), RepositoryError>;

    async fn set_profile_image(
        &self,
        id: TenantId,
        image: Option<&BlobRef>,
    ) -> Result<(), RepositoryError>;

    async fn set_push_registration(
        &self,
        id: TenantId,
        enabled: bool,
        token: Option<&str>,
    ) -> Result<(), RepositoryError>;

    /// Delete the tenant row. Returns `false` if it was already gone.
    async fn delete(&self, id: TenantId) -> Result<bool, RepositoryError>;
}

/// Store operations on customers. Every read/write is filtered by
/// `(id, tenant_id)` jointly; a mismatch reads as absent.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn create(
        &self,
        tenant_id: TenantId,
        new: NewCustomer,
    ) -> Result<Customer, RepositoryError>;

    async fn find(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
    ) -> Result<Option<Customer>, RepositoryError>;

    /// All customers of a tenant, newest first.
    async fn list(&self, tenant_id: TenantId) -> Result<Vec<Customer>, RepositoryError>;

    async fn update(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
        update: CustomerUpdate,
    ) -> Result<Option<Customer>, RepositoryError>;

    async fn set_photo(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
        photo: Option<&BlobRef>,
    ) -> Result<bool, RepositoryError>;

    /// Delete one customer, returning the deleted record for blob cleanup.
    async fn delete(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
    ) -> Result<Option<Customer>, RepositoryError>;

    /// Bulk-delete all customers of a tenant. Returns the number removed.
    async fn delete_all(&self, tenant_id: TenantId) -> Result<u64, RepositoryError>;
}

/// Store operations on measurements, tenant-scoped like [`CustomerStore`].
#[async_trait]
pub trait MeasurementStore: Send + Sync {
    async fn create(
        &self,
        tenant_id: TenantId,
        new: NewMeasurement,
    ) -> Result<Measurement, RepositoryError>;

    async fn find(
        &self,
        tenant_id: TenantId,
        id: MeasurementId,
    ) -> Result<Option<Measurement>, RepositoryError>;

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<Measurement>, RepositoryError>;

    async fn update(
        &self,
        tenant_id: TenantId,
        id: MeasurementId,
        update: MeasurementUpdate,
    ) -> Result<Option<Measurement>, RepositoryError>;

    async fn set_photo(
        &self,
        tenant_id: TenantId,
        id: MeasurementId,
        photo: Option<&BlobRef>,
    ) -> Result<bool, RepositoryError>;

    async fn delete(
        &self,
        tenant_id: TenantId,
        id: MeasurementId,
    ) -> Result<Option<Measurement>, RepositoryError>;

    async fn delete_all(&self, tenant_id: TenantId) -> Result<u64, RepositoryError>;
}

/// Store operations on orders, tenant-scoped like [`CustomerStore`].
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, tenant_id: TenantId, new: NewOrder) -> Result<Order, RepositoryError>;

    async fn find(
        &self,
        tenant_id: TenantId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError>;

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<Order>, RepositoryError>;

    async fn update(
        &self,
        tenant_id: TenantId,
        id: OrderId,
        update: OrderUpdate,
    ) -> Result<Option<Order>, RepositoryError>;

    async fn add_style_picture(
        &self,
        tenant_id: TenantId,
        id: OrderId,
        picture: &BlobRef,
    ) -> Result<bool, RepositoryError>;

    async fn add_sketch(
        &self,
        tenant_id: TenantId,
        id: OrderId,
        sketch: &BlobRef,
    ) -> Result<bool, RepositoryError>;

    async fn delete(
        &self,
        tenant_id: TenantId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError>;

    async fn delete_all(&self, tenant_id: TenantId) -> Result<u64, RepositoryError>;

    /// Promote every `pending` order created before `older_than` to
    /// `in_progress`, across all tenants, returning the promoted orders.
    ///
    /// This is the periodic sweep's primitive and deliberately not
    /// tenant-scoped; it never runs on the request path.
    async fn promote_stale_pending(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepositoryError>;
}

/// Store operations on notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create(&self, new: NewNotification) -> Result<Notification, RepositoryError>;

    /// Insert a batch of notifications. Returns the number created.
    async fn create_many(&self, batch: &[NewNotification]) -> Result<u64, RepositoryError>;

    /// All notifications of a tenant, newest first.
    async fn list(&self, tenant_id: TenantId) -> Result<Vec<Notification>, RepositoryError>;

    async fn mark_read(
        &self,
        tenant_id: TenantId,
        id: NotificationId,
    ) -> Result<bool, RepositoryError>;

    async fn mark_all_read(&self, tenant_id: TenantId) -> Result<u64, RepositoryError>;

    async fn delete_all(&self, tenant_id: TenantId) -> Result<u64, RepositoryError>;
}

/// Aggregated handle over every store trait.
///
/// Cheaply cloneable; constructed once at startup and threaded through the
/// services (never global).
#[derive(Clone)]
pub struct Store {
    pub tenants: Arc<dyn TenantStore>,
    pub customers: Arc<dyn CustomerStore>,
    pub measurements: Arc<dyn MeasurementStore>,
    pub orders: Arc<dyn OrderStore>,
    pub notifications: Arc<dyn NotificationStore>,
}

impl Store {
    /// A store backed by `PostgreSQL` repositories over `pool`.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            tenants: Arc::new(postgres::PgTenantStore::new(pool.clone())),
            customers: Arc::new(postgres::PgCustomerStore::new(pool.clone())),
            measurements: Arc::new(postgres::PgMeasurementStore::new(pool.clone())),
            orders: Arc::new(postgres::PgOrderStore::new(pool.clone())),
            notifications: Arc::new(postgres::PgNotificationStore::new(pool)),
        }
    }

    /// A deterministic in-memory store (tests, local development).
    #[must_use]
    pub fn in_memory() -> Self {
        let mem = Arc::new(memory::MemoryStore::new());
        Self {
            tenants: mem.clone(),
            customers: mem.clone(),
            measurements: mem.clone(),
            orders: mem.clone(),
            notifications: mem,
        }
    }
}
