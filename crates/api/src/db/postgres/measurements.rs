//! Measurement repository.
//!
//! Tenant-scoped like the customer repository; named entries live in a
//! JSONB column.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use stitchdesk_core::{BlobRef, MeasurementId, TenantId};

use crate::db::{MeasurementStore, RepositoryError};
use crate::models::{Measurement, MeasurementUpdate, NewMeasurement};

const MEASUREMENT_COLUMNS: &str = "id, tenant_id, customer_id, label, entries, unit, photo, \
     notes, created_at, updated_at";

/// `PostgreSQL`-backed [`MeasurementStore`].
#[derive(Clone)]
pub struct PgMeasurementStore {
    pool: PgPool,
}

impl PgMeasurementStore {
    /// Create a new measurement repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct MeasurementRow {
    id: Uuid,
    tenant_id: Uuid,
    customer_id: Option<Uuid>,
    label: String,
    entries: Json<BTreeMap<String, f64>>,
    unit: String,
    photo: Option<Json<BlobRef>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MeasurementRow> for Measurement {
    fn from(row: MeasurementRow) -> Self {
        Self {
            id: MeasurementId::new(row.id),
            tenant_id: TenantId::new(row.tenant_id),
            customer_id: row.customer_id.map(Into::into),
            label: row.label,
            values: row.entries.0,
            unit: row.unit,
            photo: row.photo.map(|Json(b)| b),
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl MeasurementStore for PgMeasurementStore {
    async fn create(
        &self,
        tenant_id: TenantId,
        new: NewMeasurement,
    ) -> Result<Measurement, RepositoryError> {
        let id = MeasurementId::generate();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO measurement (id, tenant_id, customer_id, label, entries, unit, notes, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(new.customer_id)
        .bind(&new.label)
        .bind(Json(&new.values))
        .bind(&new.unit)
        .bind(&new.notes)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Measurement {
            id,
            tenant_id,
            customer_id: new.customer_id,
            label: new.label,
            values: new.values,
            unit: new.unit,
            photo: None,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: MeasurementId,
    ) -> Result<Option<Measurement>, RepositoryError> {
        let row = sqlx::query_as::<_, MeasurementRow>(&format!(
            "SELECT {MEASUREMENT_COLUMNS} FROM measurement WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Measurement::from))
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<Measurement>, RepositoryError> {
        let rows = sqlx::query_as::<_, MeasurementRow>(&format!(
            "SELECT {MEASUREMENT_COLUMNS} FROM measurement WHERE tenant_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Measurement::from).collect())
    }

    async fn update(
        &self,
        tenant_id: TenantId,
        id: MeasurementId,
        update: MeasurementUpdate,
    ) -> Result<Option<Measurement>, RepositoryError> {
        let row = sqlx::query_as::<_, MeasurementRow>(&format!(
            "UPDATE measurement SET label = COALESCE($3, label), \
             entries = COALESCE($4, entries), unit = COALESCE($5, unit), \
             notes = COALESCE($6, notes), updated_at = $7 \
             WHERE id = $1 AND tenant_id = $2 \
             RETURNING {MEASUREMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(tenant_id)
        .bind(&update.label)
        .bind(update.values.as_ref().map(Json))
        .bind(&update.unit)
        .bind(&update.notes)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Measurement::from))
    }

    async fn set_photo(
        &self,
        tenant_id: TenantId,
        id: MeasurementId,
        photo: Option<&BlobRef>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE measurement SET photo = $3, updated_at = $4 WHERE id = $1 AND tenant_id = $2",
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
        id: MeasurementId,
    ) -> Result<Option<Measurement>, RepositoryError> {
        let row = sqlx::query_as::<_, MeasurementRow>(&format!(
            "DELETE FROM measurement WHERE id = $1 AND tenant_id = $2 \
             RETURNING {MEASUREMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Measurement::from))
    }

    async fn delete_all(&self, tenant_id: TenantId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM measurement WHERE tenant_id = $1")
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
