//! Notification routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};

use stitchdesk_core::NotificationId;

use crate::error::{AppError, Result};
use crate::middleware::TenantContext;
use crate::models::Notification;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list))
        .route("/notifications/{id}/read", post(mark_read))
        .route("/notifications/read-all", post(mark_all_read))
}

async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> Result<Json<Vec<Notification>>> {
    let notifications = state.store().notifications.list(ctx.tenant_id()).await?;
    Ok(Json(notifications))
}

async fn mark_read(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<NotificationId>,
) -> Result<StatusCode> {
    let marked = state
        .store()
        .notifications
        .mark_read(ctx.tenant_id(), id)
        .await?;

    if !marked {
        return Err(AppError::NotFound("notification".to_owned()));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(serde::Serialize)]
struct ReadAllResponse {
    marked: u64,
}

async fn mark_all_read(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> Result<Json<ReadAllResponse>> {
    let marked = state
        .store()
        .notifications
        .mark_all_read(ctx.tenant_id())
        .await?;

    Ok(Json(ReadAllResponse { marked }))
}
