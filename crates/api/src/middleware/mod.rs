//! HTTP middleware.

pub mod auth;
pub mod session;

pub use auth::{RequireAdmin, TenantContext};
pub use session::create_session_layer;
