//! Session types and keys.

use serde::{Deserialize, Serialize};

use stitchdesk_core::{Phone, TenantId};

/// Session storage keys.
pub mod session_keys {
    /// The authenticated tenant.
    pub const CURRENT_TENANT: &str = "current_tenant";
}

/// The authenticated tenant stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentTenant {
    pub id: TenantId,
    pub phone: Phone,
    pub business_name: String,
    pub is_admin: bool,
}
