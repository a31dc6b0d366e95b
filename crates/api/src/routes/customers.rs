//! Customer routes.
//!
//! The owning tenant id always comes from the authenticated
//! [`TenantContext`]; a record under another tenant reads as not found.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};

use stitchdesk_core::{BlobRef, CustomerId};

use crate::error::{AppError, Result};
use crate::middleware::TenantContext;
use crate::models::{Customer, CustomerUpdate, NewCustomer};
use crate::routes::read_upload;
use crate::services::blobs::delete_best_effort;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", post(create))
        .route("/customers", get(list))
        .route("/customers/{id}", get(fetch))
        .route("/customers/{id}", put(update))
        .route("/customers/{id}", delete(remove))
        .route("/customers/{id}/photo", post(upload_photo))
}

async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(new): Json<NewCustomer>,
) -> Result<(StatusCode, Json<Customer>)> {
    if new.name.trim().is_empty() {
        return Err(AppError::Validation("customer name cannot be empty".to_owned()));
    }

    let customer = state
        .store()
        .customers
        .create(ctx.tenant_id(), new)
        .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

async fn list(State(state): State<AppState>, ctx: TenantContext) -> Result<Json<Vec<Customer>>> {
    let customers = state.store().customers.list(ctx.tenant_id()).await?;
    Ok(Json(customers))
}

async fn fetch(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<CustomerId>,
) -> Result<Json<Customer>> {
    let customer = state
        .store()
        .customers
        .find(ctx.tenant_id(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("customer".to_owned()))?;

    Ok(Json(customer))
}

async fn update(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<CustomerId>,
    Json(update): Json<CustomerUpdate>,
) -> Result<Json<Customer>> {
    let customer = state
        .store()
        .customers
        .update(ctx.tenant_id(), id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("customer".to_owned()))?;

    Ok(Json(customer))
}

async fn remove(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<CustomerId>,
) -> Result<StatusCode> {
    let customer = state
        .store()
        .customers
        .delete(ctx.tenant_id(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("customer".to_owned()))?;

    if let Some(photo) = &customer.photo {
        delete_best_effort(state.blobs().as_ref(), photo).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn upload_photo(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<CustomerId>,
    multipart: Multipart,
) -> Result<Json<BlobRef>> {
    let customer = state
        .store()
        .customers
        .find(ctx.tenant_id(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("customer".to_owned()))?;

    let (bytes, content_type) = read_upload(multipart).await?;
    let blob = state.blobs().put(bytes, "customers", &content_type).await?;

    if let Some(old) = &customer.photo {
        delete_best_effort(state.blobs().as_ref(), old).await;
    }

    state
        .store()
        .customers
        .set_photo(ctx.tenant_id(), id, Some(&blob))
        .await?;

    Ok(Json(blob))
}
