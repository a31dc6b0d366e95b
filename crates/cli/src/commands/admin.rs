//! Admin tenant management commands.
//!
//! # Usage
//!
//! ```bash
//! stchd-cli admin create -p 08031234567 -n "Head Office" --password '...'
//! ```
//!
//! # Environment Variables
//!
//! - `STITCHDESK_DATABASE_URL` - `PostgreSQL` connection string (falls back
//!   to `DATABASE_URL`)
//! - `STITCHDESK_ADMIN_PASSWORD` - Password when `--password` is omitted

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use thiserror::Error;

use stitchdesk_api::db::{RepositoryError, Store};
use stitchdesk_api::models::{NewTenant, SubscriptionState};
use stitchdesk_core::{Phone, SubscriptionStatus, SubscriptionTier};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] RepositoryError),

    /// Invalid phone number.
    #[error("Invalid phone: {0}")]
    InvalidPhone(String),

    /// No password supplied.
    #[error("No password supplied (use --password or STITCHDESK_ADMIN_PASSWORD)")]
    MissingPassword,

    /// Password hashing failed.
    #[error("Password hashing failed")]
    PasswordHash,
}

/// Create a new admin tenant.
///
/// Admin tenants are excluded from broadcasts and carry no subscription end
/// date, so they never expire.
///
/// # Errors
///
/// Returns an error if the phone is invalid, no password is available, or
/// the store rejects the insert.
pub async fn create_tenant(
    phone: &str,
    name: &str,
    password: Option<&str>,
) -> Result<(), AdminError> {
    dotenvy::dotenv().ok();

    let phone = Phone::parse(phone).map_err(|e| AdminError::InvalidPhone(e.to_string()))?;

    let password = match password {
        Some(p) => p.to_owned(),
        None => std::env::var("STITCHDESK_ADMIN_PASSWORD")
            .map_err(|_| AdminError::MissingPassword)?,
    };

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AdminError::PasswordHash)?
        .to_string();

    let database_url = std::env::var("STITCHDESK_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| AdminError::MissingEnvVar("STITCHDESK_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;
    let store = Store::postgres(pool);

    tracing::info!("Creating admin tenant: {} ({})", name, phone);

    // No end date + active status reads as active indefinitely.
    let tenant = store
        .tenants
        .create(NewTenant {
            phone,
            password_hash,
            business_name: name.to_owned(),
            is_admin: true,
            subscription: SubscriptionState {
                tier: Some(SubscriptionTier::Trial),
                status: SubscriptionStatus::Active,
                trial_started_at: None,
                trial_ends_at: None,
                subscription_started_at: None,
                subscription_ends_at: None,
            },
        })
        .await?;

    tracing::info!("Admin tenant created: {}", tenant.id);
    Ok(())
}
