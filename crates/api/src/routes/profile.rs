//! Tenant profile routes.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::{get, post, put},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use stitchdesk_core::{BlobRef, SubscriptionWindow};

use crate::error::{AppError, Result};
use crate::middleware::TenantContext;
use crate::models::Tenant;
use crate::routes::read_upload;
use crate::services::blobs::delete_best_effort;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/me", put(update_me))
        .route("/me/photo", post(upload_photo))
        .route("/me/push", post(register_push))
}

/// Client-facing profile; never exposes the credential hash.
#[derive(Debug, Serialize)]
struct TenantProfile {
    id: stitchdesk_core::TenantId,
    phone: String,
    business_name: String,
    profile_image: Option<BlobRef>,
    push_enabled: bool,
    subscription: SubscriptionWindow,
}

impl TenantProfile {
    fn from_tenant(tenant: &Tenant, window: SubscriptionWindow) -> Self {
        Self {
            id: tenant.id,
            phone: tenant.phone.to_string(),
            business_name: tenant.business_name.clone(),
            profile_image: tenant.profile_image.clone(),
            push_enabled: tenant.push_enabled,
            subscription: window,
        }
    }
}

async fn load_tenant(state: &AppState, ctx: &TenantContext) -> Result<Tenant> {
    state
        .store()
        .tenants
        .find_by_id(ctx.tenant_id())
        .await?
        .ok_or_else(|| AppError::NotFound("account".to_owned()))
}

async fn me(State(state): State<AppState>, ctx: TenantContext) -> Result<Json<TenantProfile>> {
    let tenant = load_tenant(&state, &ctx).await?;
    let window = state.subscriptions().evaluate(&tenant, Utc::now()).await?;

    Ok(Json(TenantProfile::from_tenant(&tenant, window)))
}

#[derive(Debug, Deserialize)]
struct UpdateProfileRequest {
    business_name: String,
}

async fn update_me(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<TenantProfile>> {
    if req.business_name.trim().is_empty() {
        return Err(AppError::Validation("business name cannot be empty".to_owned()));
    }

    state
        .store()
        .tenants
        .update_business_name(ctx.tenant_id(), req.business_name.trim())
        .await?;

    let tenant = load_tenant(&state, &ctx).await?;
    let window = state.subscriptions().evaluate(&tenant, Utc::now()).await?;

    Ok(Json(TenantProfile::from_tenant(&tenant, window)))
}

async fn upload_photo(
    State(state): State<AppState>,
    ctx: TenantContext,
    multipart: Multipart,
) -> Result<Json<BlobRef>> {
    let tenant = load_tenant(&state, &ctx).await?;
    let (bytes, content_type) = read_upload(multipart).await?;

    // Upload failures are fatal and surfaced; only the replaced image's
    // cleanup is best-effort.
    let blob = state.blobs().put(bytes, "profiles", &content_type).await?;

    if let Some(old) = &tenant.profile_image {
        delete_best_effort(state.blobs().as_ref(), old).await;
    }

    state
        .store()
        .tenants
        .set_profile_image(ctx.tenant_id(), Some(&blob))
        .await?;

    Ok(Json(blob))
}

#[derive(Debug, Deserialize)]
struct PushRegistration {
    enabled: bool,
    token: Option<String>,
}

async fn register_push(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(req): Json<PushRegistration>,
) -> Result<axum::http::StatusCode> {
    if req.enabled && req.token.is_none() {
        return Err(AppError::Validation(
            "a device token is required to enable push".to_owned(),
        ));
    }

    state
        .store()
        .tenants
        .set_push_registration(ctx.tenant_id(), req.enabled, req.token.as_deref())
        .await?;

    Ok(axum::http::StatusCode::NO_CONTENT)
}
