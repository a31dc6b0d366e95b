//! Authentication service.
//!
//! Phone + password authentication. The phone number is normalized at the
//! boundary and doubles as the unique login identifier; passwords are hashed
//! with Argon2id.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};

use stitchdesk_core::{Phone, PhoneError};

use crate::db::{RepositoryError, TenantStore};
use crate::models::{NewTenant, SubscriptionState, Tenant};
use crate::services::subscription::TRIAL_PERIOD_DAYS;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors that can occur during authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Invalid phone format.
    #[error("invalid phone: {0}")]
    InvalidPhone(#[from] PhoneError),

    /// Invalid credentials (wrong password or unknown phone).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Phone already registered.
    #[error("account already exists")]
    AlreadyRegistered,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Authentication service.
///
/// Handles tenant signup and login.
#[derive(Clone)]
pub struct AuthService {
    tenants: Arc<dyn TenantStore>,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(tenants: Arc<dyn TenantStore>) -> Self {
        Self { tenants }
    }

    /// Register a new tenant.
    ///
    /// Every new tenant starts on a fresh 30-day trial.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidPhone` if the phone does not normalize to
    /// 11 digits, `AuthError::WeakPassword` if the password is too short, or
    /// `AuthError::AlreadyRegistered` if the phone is taken.
    pub async fn signup(
        &self,
        phone: &str,
        password: &str,
        business_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Tenant, AuthError> {
        let phone = Phone::parse(phone)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let trial = SubscriptionState::trial(now, now + Duration::days(TRIAL_PERIOD_DAYS));

        let tenant = self
            .tenants
            .create(NewTenant {
                phone,
                password_hash,
                business_name: business_name.to_owned(),
                is_admin: false,
                subscription: trial,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::AlreadyRegistered,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(tenant = %tenant.id, "tenant registered");
        Ok(tenant)
    }

    /// Login with phone and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the phone/password pair is
    /// wrong. Unknown phone and wrong password are indistinguishable.
    pub async fn login(&self, phone: &str, password: &str) -> Result<Tenant, AuthError> {
        let phone = Phone::parse(phone)?;

        let tenant = self
            .tenants
            .find_by_phone(&phone)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password_matches(password, &tenant.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(tenant)
    }
}

/// Validate password strength.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
pub(crate) fn password_matches(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_too_short() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse battery").expect("hash");
        assert!(password_matches("correct horse battery", &hash));
        assert!(!password_matches("wrong password", &hash));
    }

    #[test]
    fn test_password_matches_rejects_garbage_hash() {
        assert!(!password_matches("anything", "not-a-phc-string"));
    }
}
