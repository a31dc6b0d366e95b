//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST /auth/signup            - Register a tenant (starts a 30-day trial)
//! POST /auth/login             - Login with phone + password
//! POST /auth/logout            - Logout
//!
//! # Profile (requires auth)
//! GET  /me                     - Profile incl. evaluated subscription window
//! PUT  /me                     - Update business name
//! POST /me/photo               - Upload/replace profile image (multipart)
//! POST /me/push                - Register/unregister push token
//!
//! # Subscription (requires auth)
//! GET  /subscription           - Evaluated access window
//! GET  /subscription/plans     - Tier catalogue
//! POST /subscription/pay       - Initialize a gateway payment
//! GET  /subscription/verify    - Verify a transaction by reference
//!
//! # Customers / Measurements / Orders (requires auth)
//! POST/GET            /customers, /measurements, /orders
//! GET/PUT/DELETE      /customers/{id}, /measurements/{id}, /orders/{id}
//! POST /customers/{id}/photo          - Upload customer photo (multipart)
//! POST /measurements/{id}/photo       - Upload reference photo (multipart)
//! POST /orders/{id}/style-pictures    - Attach a style picture (multipart)
//! POST /orders/{id}/sketches          - Attach a sketch (multipart)
//!
//! # Notifications (requires auth)
//! GET  /notifications          - List, newest first
//! POST /notifications/{id}/read - Mark one read
//! POST /notifications/read-all  - Mark all read
//!
//! # Account deletion
//! POST /account/delete          - Password-verified deletion (requires auth)
//! POST /account/delete-by-phone - Phone-only deletion (reduced auth; see
//!                                 services::deletion docs)
//!
//! # Admin
//! POST /admin/broadcast                    - Broadcast to a tenant subset
//! POST /admin/tenants/{id}/subscription    - Override a tenant's tier/dates
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod customers;
pub mod measurements;
pub mod notifications;
pub mod orders;
pub mod profile;
pub mod subscription;

use axum::Router;
use axum::extract::Multipart;

use crate::error::AppError;
use crate::state::AppState;

/// Assemble all route modules.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(profile::routes())
        .merge(subscription::routes())
        .merge(customers::routes())
        .merge(measurements::routes())
        .merge(orders::routes())
        .merge(notifications::routes())
        .merge(account::routes())
        .merge(admin::routes())
}

/// Read the first `file` field of a multipart upload.
pub(crate) async fn read_upload(
    mut multipart: Multipart,
) -> Result<(Vec<u8>, String), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() == Some("file") {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_owned();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(e.to_string()))?;
            return Ok((bytes.to_vec(), content_type));
        }
    }

    Err(AppError::Validation("missing file field".to_owned()))
}
