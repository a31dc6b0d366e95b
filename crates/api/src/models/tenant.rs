//! Tenant domain types.
//!
//! A tenant is a business-owner account: the unit of data isolation. Every
//! other record in the system carries a tenant id set by the server from the
//! authenticated session.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stitchdesk_core::{
    BlobRef, PaymentStatus, Phone, SubscriptionStatus, SubscriptionTier, TenantId,
};

/// A business-owner account (domain type).
#[derive(Debug, Clone)]
pub struct Tenant {
    /// Unique tenant ID.
    pub id: TenantId,
    /// Normalized phone number; the immutable login identifier.
    pub phone: Phone,
    /// Argon2 hash of the tenant's password.
    pub password_hash: String,
    /// Display name of the business.
    pub business_name: String,
    /// Administrators are excluded from broadcasts and never expire.
    pub is_admin: bool,
    /// Persisted subscription state.
    pub subscription: SubscriptionState,
    /// At most one in-flight payment transaction.
    pub pending_payment: Option<PendingPayment>,
    /// Append-only sequence of settled transactions, oldest first.
    pub payment_history: Vec<PaymentRecord>,
    /// Whether the tenant opted into push notifications.
    pub push_enabled: bool,
    /// Registered device token, if any.
    pub push_token: Option<String>,
    /// Profile image in the blob store.
    pub profile_image: Option<BlobRef>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// The end date governing the tenant's access window.
    ///
    /// The trial end date takes precedence if both pairs are somehow
    /// populated.
    #[must_use]
    pub fn relevant_end_date(&self) -> Option<DateTime<Utc>> {
        self.subscription
            .trial_ends_at
            .or(self.subscription.subscription_ends_at)
    }

    /// Whether a settled transaction with this reference already exists.
    #[must_use]
    pub fn has_payment(&self, tx_ref: &str) -> bool {
        self.payment_history.iter().any(|p| p.tx_ref == tx_ref)
    }
}

/// The persisted portion of a tenant's subscription state.
///
/// Invariant: exactly one of the trial/paid date pairs is populated at any
/// time; transitions clear the other pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionState {
    /// `None` marks a legacy record that predates subscription tracking;
    /// evaluation initializes it as a fresh trial.
    pub tier: Option<SubscriptionTier>,
    pub status: SubscriptionStatus,
    pub trial_started_at: Option<DateTime<Utc>>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub subscription_started_at: Option<DateTime<Utc>>,
    pub subscription_ends_at: Option<DateTime<Utc>>,
}

impl SubscriptionState {
    /// A fresh trial window starting at `started_at`.
    #[must_use]
    pub fn trial(started_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        Self {
            tier: Some(SubscriptionTier::Trial),
            status: SubscriptionStatus::Active,
            trial_started_at: Some(started_at),
            trial_ends_at: Some(ends_at),
            subscription_started_at: None,
            subscription_ends_at: None,
        }
    }

    /// An active paid window; clears the trial dates.
    #[must_use]
    pub fn paid(
        tier: SubscriptionTier,
        started_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tier: Some(tier),
            status: SubscriptionStatus::Active,
            trial_started_at: None,
            trial_ends_at: None,
            subscription_started_at: Some(started_at),
            subscription_ends_at: Some(ends_at),
        }
    }
}

/// An in-flight payment transaction awaiting gateway verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPayment {
    /// Gateway transaction reference.
    pub tx_ref: String,
    /// Tier the tenant is paying for.
    pub tier: SubscriptionTier,
    /// Amount charged.
    pub amount: Decimal,
    /// ISO currency code.
    pub currency: String,
    /// When the transaction was initialized.
    pub created_at: DateTime<Utc>,
}

/// A settled payment transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Gateway transaction reference; unique within a tenant's history.
    pub tx_ref: String,
    /// Tier the payment bought.
    pub tier: SubscriptionTier,
    /// Amount settled.
    pub amount: Decimal,
    /// ISO currency code.
    pub currency: String,
    /// Settlement status as reported by the gateway.
    pub status: PaymentStatus,
    /// When the payment settled.
    pub settled_at: DateTime<Utc>,
}

/// Data required to create a tenant.
#[derive(Debug, Clone)]
pub struct NewTenant {
    pub phone: Phone,
    pub password_hash: String,
    pub business_name: String,
    pub is_admin: bool,
    pub subscription: SubscriptionState,
}
