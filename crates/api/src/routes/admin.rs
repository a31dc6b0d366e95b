//! Administrative routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use stitchdesk_core::{BroadcastCriterion, SubscriptionTier, TenantId};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::SubscriptionState;
use crate::services::BroadcastOutcome;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/broadcast", post(broadcast))
        .route("/admin/tenants/{id}/subscription", post(change_subscription))
}

#[derive(Debug, Deserialize)]
struct BroadcastRequest {
    criterion: Option<String>,
    title: String,
    message: String,
}

async fn broadcast(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(req): Json<BroadcastRequest>,
) -> Result<Json<BroadcastOutcome>> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_owned()));
    }

    let criterion = BroadcastCriterion::parse(req.criterion.as_deref());

    let outcome = state
        .broadcaster()
        .broadcast(criterion, &req.title, &req.message, Utc::now())
        .await?;

    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
struct ChangeSubscriptionRequest {
    tier: SubscriptionTier,
    started_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
}

async fn change_subscription(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<TenantId>,
    Json(req): Json<ChangeSubscriptionRequest>,
) -> Result<Json<SubscriptionState>> {
    let tenant = state
        .store()
        .tenants
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("tenant".to_owned()))?;

    let applied = state
        .subscriptions()
        .change_tier(&tenant, req.tier, req.started_at, req.ends_at, Utc::now())
        .await?;

    Ok(Json(applied))
}
