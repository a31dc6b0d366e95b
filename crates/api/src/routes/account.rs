//! Account deletion routes.
//!
//! Two entry points with different authorization surfaces:
//!
//! - `POST /account/delete` requires a live session and re-verifies the
//!   password before running the cascade.
//! - `POST /account/delete-by-phone` accepts a phone number alone. This is
//!   the single click-through deletion flow; the reduced authentication is a
//!   deliberate, documented risk (see `services::deletion`).

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::Deserialize;
use tower_sessions::Session;

use stitchdesk_core::Phone;

use crate::error::{AppError, Result};
use crate::middleware::TenantContext;
use crate::middleware::auth::clear_current_tenant;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/account/delete", post(delete_account))
        .route("/account/delete-by-phone", post(delete_by_phone))
}

#[derive(Debug, Deserialize)]
struct DeleteRequest {
    password: String,
}

async fn delete_account(
    State(state): State<AppState>,
    ctx: TenantContext,
    session: Session,
    Json(req): Json<DeleteRequest>,
) -> Result<StatusCode> {
    let phone = ctx.tenant().phone.clone();

    state
        .deletion()
        .delete_with_password(&phone, &req.password)
        .await?;

    clear_current_tenant(&session)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct DeleteByPhoneRequest {
    phone: String,
}

async fn delete_by_phone(
    State(state): State<AppState>,
    Json(req): Json<DeleteByPhoneRequest>,
) -> Result<StatusCode> {
    let phone = Phone::parse(&req.phone).map_err(|e| AppError::Validation(e.to_string()))?;

    state.deletion().delete_by_phone(&phone).await?;

    Ok(StatusCode::NO_CONTENT)
}
