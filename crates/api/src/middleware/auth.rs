//! Authentication extractors.
//!
//! [`TenantContext`] is the authorization capability for tenant-scoped
//! operations: every handler that touches tenant-owned data takes it as a
//! parameter, and the owning tenant id always comes from it - never from
//! client input, even if present in the request payload.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use stitchdesk_core::TenantId;

use crate::models::CurrentTenant;
use crate::models::session::session_keys;

/// Extractor that requires an authenticated tenant.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     ctx: TenantContext,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", ctx.tenant().business_name)
/// }
/// ```
pub struct TenantContext(CurrentTenant);

impl TenantContext {
    /// The authenticated tenant's id.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.0.id
    }

    /// The authenticated tenant.
    #[must_use]
    pub const fn tenant(&self) -> &CurrentTenant {
        &self.0
    }
}

/// Error returned when authentication is required but missing.
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts.extensions.get::<Session>().ok_or(AuthRejection)?;

        let tenant: CurrentTenant = session
            .get(session_keys::CURRENT_TENANT)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection)?;

        Ok(Self(tenant))
    }
}

/// Extractor that additionally requires the admin flag.
pub struct RequireAdmin(pub CurrentTenant);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TenantContext(tenant) = TenantContext::from_request_parts(parts, state).await?;

        if !tenant.is_admin {
            return Err(AuthRejection);
        }

        Ok(Self(tenant))
    }
}

/// Helper to set the current tenant in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_tenant(
    session: &Session,
    tenant: &CurrentTenant,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_TENANT, tenant).await
}

/// Helper to clear the current tenant from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_tenant(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentTenant>(session_keys::CURRENT_TENANT)
        .await?;
    Ok(())
}
