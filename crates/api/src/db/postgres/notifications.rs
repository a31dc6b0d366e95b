//! Notification repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use stitchdesk_core::{NotificationId, NotificationKind, TenantId};

use crate::db::{NotificationStore, RepositoryError};
use crate::models::{NewNotification, Notification};

const NOTIFICATION_COLUMNS: &str = "id, tenant_id, title, body, kind, read, created_at";

/// `PostgreSQL`-backed [`NotificationStore`].
#[derive(Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    tenant_id: Uuid,
    title: String,
    body: String,
    kind: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = RepositoryError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let kind: NotificationKind = row.kind.parse().map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: NotificationId::new(row.id),
            tenant_id: TenantId::new(row.tenant_id),
            title: row.title,
            body: row.body,
            kind,
            read: row.read,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn create(&self, new: NewNotification) -> Result<Notification, RepositoryError> {
        let id = NotificationId::generate();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO notification (id, tenant_id, title, body, kind, read, created_at) \
             VALUES ($1, $2, $3, $4, $5, FALSE, $6)",
        )
        .bind(id)
        .bind(new.tenant_id)
        .bind(&new.title)
        .bind(&new.body)
        .bind(new.kind.to_string())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Notification {
            id,
            tenant_id: new.tenant_id,
            title: new.title,
            body: new.body,
            kind: new.kind,
            read: false,
            created_at: now,
        })
    }

    async fn create_many(&self, batch: &[NewNotification]) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        for new in batch {
            sqlx::query(
                "INSERT INTO notification (id, tenant_id, title, body, kind, read, created_at) \
                 VALUES ($1, $2, $3, $4, $5, FALSE, $6)",
            )
            .bind(NotificationId::generate())
            .bind(new.tenant_id)
            .bind(&new.title)
            .bind(&new.body)
            .bind(new.kind.to_string())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(batch.len() as u64)
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notification WHERE tenant_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn mark_read(
        &self,
        tenant_id: TenantId,
        id: NotificationId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE notification SET read = TRUE WHERE id = $1 AND tenant_id = $2")
                .bind(id)
                .bind(tenant_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, tenant_id: TenantId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE notification SET read = TRUE WHERE tenant_id = $1 AND read = FALSE",
        )
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_all(&self, tenant_id: TenantId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM notification WHERE tenant_id = $1")
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
