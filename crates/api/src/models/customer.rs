//! Customer domain types.

use chrono::{DateTime, Utc};

use stitchdesk_core::{BlobRef, CustomerId, TenantId};

/// A customer of a tenant's tailoring business.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Customer {
    /// Unique customer ID.
    pub id: CustomerId,
    /// Owning tenant; set by the server, never from client input.
    pub tenant_id: TenantId,
    /// Customer's full name.
    pub name: String,
    /// Contact phone, free-form (customers are not login identities).
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    /// Customer photo in the blob store.
    pub photo: Option<BlobRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a customer.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}
