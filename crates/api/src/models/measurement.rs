//! Measurement domain types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use stitchdesk_core::{BlobRef, CustomerId, MeasurementId, TenantId};

/// A set of named body measurements, optionally tied to a customer.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Measurement {
    /// Unique measurement ID.
    pub id: MeasurementId,
    /// Owning tenant; set by the server, never from client input.
    pub tenant_id: TenantId,
    /// Customer the measurements belong to, if recorded against one.
    pub customer_id: Option<CustomerId>,
    /// Display label, e.g. "Wedding agbada".
    pub label: String,
    /// Named entries, e.g. `{"chest": 40.5, "sleeve": 24.0}`.
    pub values: BTreeMap<String, f64>,
    /// Unit for all entries, e.g. "in" or "cm".
    pub unit: String,
    /// Reference photo in the blob store.
    pub photo: Option<BlobRef>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a measurement.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewMeasurement {
    pub customer_id: Option<CustomerId>,
    pub label: String,
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
    pub unit: String,
    pub notes: Option<String>,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct MeasurementUpdate {
    pub label: Option<String>,
    pub values: Option<BTreeMap<String, f64>>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}
