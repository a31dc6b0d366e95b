//! Customer repository.
//!
//! Every query filters by `(id, tenant_id)` jointly; a record that exists
//! under another tenant is indistinguishable from one that does not exist.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use stitchdesk_core::{BlobRef, CustomerId, TenantId};

use crate::db::{CustomerStore, RepositoryError};
use crate::models::{Customer, CustomerUpdate, NewCustomer};

const CUSTOMER_COLUMNS: &str =
    "id, tenant_id, name, phone, email, address, notes, photo, created_at, updated_at";

/// `PostgreSQL`-backed [`CustomerStore`].
#[derive(Clone)]
pub struct PgCustomerStore {
    pool: PgPool,
}

impl PgCustomerStore {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    notes: Option<String>,
    photo: Option<Json<BlobRef>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: CustomerId::new(row.id),
            tenant_id: TenantId::new(row.tenant_id),
            name: row.name,
            phone: row.phone,
            email: row.email,
            address: row.address,
            notes: row.notes,
            photo: row.photo.map(|Json(b)| b),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl CustomerStore for PgCustomerStore {
    async fn create(
        &self,
        tenant_id: TenantId,
        new: NewCustomer,
    ) -> Result<Customer, RepositoryError> {
        let id = CustomerId::generate();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO customer (id, tenant_id, name, phone, email, address, notes, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(&new.name)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(&new.address)
        .bind(&new.notes)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Customer {
            id,
            tenant_id,
            name: new.name,
            phone: new.phone,
            email: new.email,
            address: new.address,
            notes: new.notes,
            photo: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer WHERE tenant_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn update(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
        update: CustomerUpdate,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "UPDATE customer SET name = COALESCE($3, name), phone = COALESCE($4, phone), \
             email = COALESCE($5, email), address = COALESCE($6, address), \
             notes = COALESCE($7, notes), updated_at = $8 \
             WHERE id = $1 AND tenant_id = $2 \
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(id)
        .bind(tenant_id)
        .bind(&update.name)
        .bind(&update.phone)
        .bind(&update.email)
        .bind(&update.address)
        .bind(&update.notes)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }

    async fn set_photo(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
        photo: Option<&BlobRef>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE customer SET photo = $3, updated_at = $4 WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(photo.map(Json))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "DELETE FROM customer WHERE id = $1 AND tenant_id = $2 RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }

    async fn delete_all(&self, tenant_id: TenantId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM customer WHERE tenant_id = $1")
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
