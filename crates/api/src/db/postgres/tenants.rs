//! Tenant repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use stitchdesk_core::{BlobRef, Phone, TenantId};

use crate::db::{RepositoryError, TenantStore};
use crate::models::{NewTenant, PaymentRecord, PendingPayment, SubscriptionState, Tenant};

const TENANT_COLUMNS: &str = "id, phone, password_hash, business_name, is_admin, \
     subscription_tier, subscription_status, trial_started_at, trial_ends_at, \
     subscription_started_at, subscription_ends_at, pending_payment, payment_history, \
     push_enabled, push_token, profile_image, created_at, updated_at";

/// `PostgreSQL`-backed [`TenantStore`].
#[derive(Clone)]
pub struct PgTenantStore {
    pool: PgPool,
}

impl PgTenantStore {
    /// Create a new tenant repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TenantRow {
    id: Uuid,
    phone: String,
    password_hash: String,
    business_name: String,
    is_admin: bool,
    subscription_tier: Option<String>,
    subscription_status: String,
    trial_started_at: Option<DateTime<Utc>>,
    trial_ends_at: Option<DateTime<Utc>>,
    subscription_started_at: Option<DateTime<Utc>>,
    subscription_ends_at: Option<DateTime<Utc>>,
    pending_payment: Option<Json<PendingPayment>>,
    payment_history: Json<Vec<PaymentRecord>>,
    push_enabled: bool,
    push_token: Option<String>,
    profile_image: Option<Json<BlobRef>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TenantRow> for Tenant {
    type Error = RepositoryError;

    fn try_from(row: TenantRow) -> Result<Self, Self::Error> {
        let phone = Phone::parse(&row.phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
        })?;

        let tier = row
            .subscription_tier
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(RepositoryError::DataCorruption)?;

        let status = row
            .subscription_status
            .parse()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: TenantId::new(row.id),
            phone,
            password_hash: row.password_hash,
            business_name: row.business_name,
            is_admin: row.is_admin,
            subscription: SubscriptionState {
                tier,
                status,
                trial_started_at: row.trial_started_at,
                trial_ends_at: row.trial_ends_at,
                subscription_started_at: row.subscription_started_at,
                subscription_ends_at: row.subscription_ends_at,
            },
            pending_payment: row.pending_payment.map(|Json(p)| p),
            payment_history: row.payment_history.0,
            push_enabled: row.push_enabled,
            push_token: row.push_token,
            profile_image: row.profile_image.map(|Json(b)| b),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl TenantStore for PgTenantStore {
    async fn create(&self, new: NewTenant) -> Result<Tenant, RepositoryError> {
        let id = TenantId::generate();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO tenant (id, phone, password_hash, business_name, is_admin, \
             subscription_tier, subscription_status, trial_started_at, trial_ends_at, \
             subscription_started_at, subscription_ends_at, payment_history, push_enabled, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, '[]', FALSE, $12, $12)",
        )
        .bind(id)
        .bind(new.phone.as_str())
        .bind(&new.password_hash)
        .bind(&new.business_name)
        .bind(new.is_admin)
        .bind(new.subscription.tier.map(|t| t.to_string()))
        .bind(new.subscription.status.to_string())
        .bind(new.subscription.trial_started_at)
        .bind(new.subscription.trial_ends_at)
        .bind(new.subscription.subscription_started_at)
        .bind(new.subscription.subscription_ends_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("phone already registered".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(Tenant {
            id,
            phone: new.phone,
            password_hash: new.password_hash,
            business_name: new.business_name,
            is_admin: new.is_admin,
            subscription: new.subscription,
            pending_payment: None,
            payment_history: Vec::new(),
            push_enabled: false,
            push_token: None,
            profile_image: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find_by_id(&self, id: TenantId) -> Result<Option<Tenant>, RepositoryError> {
        let row = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenant WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Tenant::try_from).transpose()
    }

    async fn find_by_phone(&self, phone: &Phone) -> Result<Option<Tenant>, RepositoryError> {
        let row = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenant WHERE phone = $1"
        ))
        .bind(phone.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Tenant::try_from).transpose()
    }

    async fn list_non_admin(&self) -> Result<Vec<Tenant>, RepositoryError> {
        let rows = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenant WHERE is_admin = FALSE ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Tenant::try_from).collect()
    }

    async fn update_subscription(
        &self,
        id: TenantId,
        state: &SubscriptionState,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE tenant SET subscription_tier = $2, subscription_status = $3, \
             trial_started_at = $4, trial_ends_at = $5, subscription_started_at = $6, \
             subscription_ends_at = $7, updated_at = $8 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(state.tier.map(|t| t.to_string()))
        .bind(state.status.to_string())
        .bind(state.trial_started_at)
        .bind(state.trial_ends_at)
        .bind(state.subscription_started_at)
        .bind(state.subscription_ends_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn set_pending_payment(
        &self,
        id: TenantId,
        pending: Option<&PendingPayment>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE tenant SET pending_payment = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(pending.map(Json))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn record_payment(
        &self,
        id: TenantId,
        record: &PaymentRecord,
        state: &SubscriptionState,
    ) -> Result<(), RepositoryError> {
        // Single-document update: append to history, apply the new window,
        // and clear the pending marker together.
        let result = sqlx::query(
            "UPDATE tenant SET payment_history = payment_history || $2, \
             subscription_tier = $3, subscription_status = $4, \
             trial_started_at = $5, trial_ends_at = $6, \
             subscription_started_at = $7, subscription_ends_at = $8, \
             pending_payment = NULL, updated_at = $9 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(Json(record))
        .bind(state.tier.map(|t| t.to_string()))
        .bind(state.status.to_string())
        .bind(state.trial_started_at)
        .bind(state.trial_ends_at)
        .bind(state.subscription_started_at)
        .bind(state.subscription_ends_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn update_business_name(
        &self,
        id: TenantId,
        business_name: &str,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE tenant SET business_name = $2, updated_at = $3 WHERE id = $1")
                .bind(id)
                .bind(business_name)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn set_profile_image(
        &self,
        id: TenantId,
        image: Option<&BlobRef>,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE tenant SET profile_image = $2, updated_at = $3 WHERE id = $1")
                .bind(id)
                .bind(image.map(Json))
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn set_push_registration(
        &self,
        id: TenantId,
        enabled: bool,
        token: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE tenant SET push_enabled = $2, push_token = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(enabled)
        .bind(token)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, id: TenantId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM tenant WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
