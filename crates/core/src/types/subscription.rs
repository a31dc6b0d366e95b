//! Subscription tiers, statuses, and the derived access window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::status::NotificationKind;

/// Subscription tier a tenant is on.
///
/// Every tenant starts on `trial`; the paid tiers are reachable only through
/// a verified payment (or an administrator override).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    #[default]
    Trial,
    Monthly,
    Quarterly,
    Yearly,
}

impl SubscriptionTier {
    /// Number of calendar months a paid period of this tier lasts.
    ///
    /// Returns `None` for the trial tier, whose window is fixed at signup.
    #[must_use]
    pub const fn period_months(&self) -> Option<u32> {
        match self {
            Self::Trial => None,
            Self::Monthly => Some(1),
            Self::Quarterly => Some(3),
            Self::Yearly => Some(12),
        }
    }

    /// Whether this is a paid tier.
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        !matches!(self, Self::Trial)
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trial => write!(f, "trial"),
            Self::Monthly => write!(f, "monthly"),
            Self::Quarterly => write!(f, "quarterly"),
            Self::Yearly => write!(f, "yearly"),
        }
    }
}

impl std::str::FromStr for SubscriptionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trial" => Ok(Self::Trial),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(format!("invalid subscription tier: {s}")),
        }
    }
}

/// Stored subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Expired,
    Cancelled,
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Expired => write!(f, "expired"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid subscription status: {s}")),
        }
    }
}

/// The derived subscription window returned by a status query.
///
/// This is computed from the stored dates and the current time at read time;
/// it is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionWindow {
    pub tier: SubscriptionTier,
    pub status: SubscriptionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_ends_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_ends_at: Option<DateTime<Utc>>,
    /// Whole days left before the relevant end date, never negative.
    pub days_remaining: i64,
}

/// Targeting criterion for a notification broadcast.
///
/// Parsed leniently: the singular `trial_user` is accepted as a synonym for
/// `trial_users`, and anything unrecognized (or absent) targets all
/// non-admin tenants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastCriterion {
    /// Active tenants whose relevant end date falls within the next 7 days.
    ExpiringSoon,
    /// Tenants stored as expired, plus lazily-expired active tenants.
    Expired,
    /// Tenants on an active trial.
    TrialUsers,
    /// All non-admin tenants.
    All,
}

impl BroadcastCriterion {
    /// Parse a criterion string, tolerating absence and unknown values.
    #[must_use]
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("expiring_soon") => Self::ExpiringSoon,
            Some("expired") => Self::Expired,
            Some("trial_users" | "trial_user") => Self::TrialUsers,
            _ => Self::All,
        }
    }

    /// The notification kind recorded for broadcasts under this criterion.
    #[must_use]
    pub const fn notification_kind(&self) -> NotificationKind {
        match self {
            Self::ExpiringSoon | Self::Expired | Self::TrialUsers => NotificationKind::Subscription,
            Self::All => NotificationKind::General,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_period_months() {
        assert_eq!(SubscriptionTier::Trial.period_months(), None);
        assert_eq!(SubscriptionTier::Monthly.period_months(), Some(1));
        assert_eq!(SubscriptionTier::Quarterly.period_months(), Some(3));
        assert_eq!(SubscriptionTier::Yearly.period_months(), Some(12));
    }

    #[test]
    fn test_tier_round_trips_through_from_str() {
        for tier in [
            SubscriptionTier::Trial,
            SubscriptionTier::Monthly,
            SubscriptionTier::Quarterly,
            SubscriptionTier::Yearly,
        ] {
            let parsed: SubscriptionTier = tier.to_string().parse().expect("valid tier");
            assert_eq!(tier, parsed);
        }
    }

    #[test]
    fn test_criterion_parse_known_values() {
        assert_eq!(
            BroadcastCriterion::parse(Some("expiring_soon")),
            BroadcastCriterion::ExpiringSoon
        );
        assert_eq!(
            BroadcastCriterion::parse(Some("expired")),
            BroadcastCriterion::Expired
        );
        assert_eq!(
            BroadcastCriterion::parse(Some("trial_users")),
            BroadcastCriterion::TrialUsers
        );
    }

    #[test]
    fn test_criterion_parse_trial_user_synonym() {
        assert_eq!(
            BroadcastCriterion::parse(Some("trial_user")),
            BroadcastCriterion::TrialUsers
        );
    }

    #[test]
    fn test_criterion_parse_unknown_or_missing_is_all() {
        assert_eq!(
            BroadcastCriterion::parse(Some("everyone")),
            BroadcastCriterion::All
        );
        assert_eq!(BroadcastCriterion::parse(None), BroadcastCriterion::All);
    }
}
