//! Order repository.
//!
//! Tenant-scoped on the request path; the sweep primitive
//! [`promote_stale_pending`](crate::db::OrderStore::promote_stale_pending)
//! is the one deliberate exception, running across all tenants outside
//! request context.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use stitchdesk_core::{BlobRef, OrderId, OrderStatus, TenantId};

use crate::db::{OrderStore, RepositoryError};
use crate::models::{NewOrder, Order, OrderUpdate};

const ORDER_COLUMNS: &str = "id, tenant_id, customer_id, title, description, status, due_date, \
     charge, style_pictures, sketches, created_at, updated_at";

/// `PostgreSQL`-backed [`OrderStore`].
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    tenant_id: Uuid,
    customer_id: Option<Uuid>,
    title: String,
    description: Option<String>,
    status: String,
    due_date: Option<DateTime<Utc>>,
    charge: Option<Decimal>,
    style_pictures: Json<Vec<BlobRef>>,
    sketches: Json<Vec<BlobRef>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row
            .status
            .parse()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: OrderId::new(row.id),
            tenant_id: TenantId::new(row.tenant_id),
            customer_id: row.customer_id.map(Into::into),
            title: row.title,
            description: row.description,
            status,
            due_date: row.due_date,
            charge: row.charge,
            style_pictures: row.style_pictures.0,
            sketches: row.sketches.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create(&self, tenant_id: TenantId, new: NewOrder) -> Result<Order, RepositoryError> {
        let id = OrderId::generate();
        let now = Utc::now();
        let status = OrderStatus::Pending;

        sqlx::query(
            "INSERT INTO orders (id, tenant_id, customer_id, title, description, status, \
             due_date, charge, style_pictures, sketches, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, '[]', '[]', $9, $9)",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(new.customer_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(status.to_string())
        .bind(new.due_date)
        .bind(new.charge)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Order {
            id,
            tenant_id,
            customer_id: new.customer_id,
            title: new.title,
            description: new.description,
            status,
            due_date: new.due_date,
            charge: new.charge,
            style_pictures: Vec::new(),
            sketches: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE tenant_id = $1 ORDER BY created_at DESC"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn update(
        &self,
        tenant_id: TenantId,
        id: OrderId,
        update: OrderUpdate,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET title = COALESCE($3, title), \
             description = COALESCE($4, description), status = COALESCE($5, status), \
             due_date = COALESCE($6, due_date), charge = COALESCE($7, charge), \
             updated_at = $8 \
             WHERE id = $1 AND tenant_id = $2 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(tenant_id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.status.map(|s| s.to_string()))
        .bind(update.due_date)
        .bind(update.charge)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn add_style_picture(
        &self,
        tenant_id: TenantId,
        id: OrderId,
        picture: &BlobRef,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET style_pictures = style_pictures || $3, updated_at = $4 \
             WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(Json(picture))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_sketch(
        &self,
        tenant_id: TenantId,
        id: OrderId,
        sketch: &BlobRef,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET sketches = sketches || $3, updated_at = $4 \
             WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(Json(sketch))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(
        &self,
        tenant_id: TenantId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "DELETE FROM orders WHERE id = $1 AND tenant_id = $2 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn delete_all(&self, tenant_id: TenantId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE tenant_id = $1")
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn promote_stale_pending(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET status = 'in_progress', updated_at = $2 \
             WHERE status = 'pending' AND created_at < $1 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(older_than)
        .bind(Utc::now())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }
}
