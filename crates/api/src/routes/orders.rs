//! Order routes.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};

use stitchdesk_core::{BlobRef, OrderId};

use crate::error::{AppError, Result};
use crate::middleware::TenantContext;
use crate::models::{NewOrder, Order, OrderUpdate};
use crate::routes::read_upload;
use crate::services::blobs::delete_best_effort;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create))
        .route("/orders", get(list))
        .route("/orders/{id}", get(fetch))
        .route("/orders/{id}", put(update))
        .route("/orders/{id}", delete(remove))
        .route("/orders/{id}/style-pictures", post(upload_style_picture))
        .route("/orders/{id}/sketches", post(upload_sketch))
}

async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(new): Json<NewOrder>,
) -> Result<(StatusCode, Json<Order>)> {
    if new.title.trim().is_empty() {
        return Err(AppError::Validation("order title cannot be empty".to_owned()));
    }

    if let Some(customer_id) = new.customer_id
        && state
            .store()
            .customers
            .find(ctx.tenant_id(), customer_id)
            .await?
            .is_none()
    {
        return Err(AppError::NotFound("customer".to_owned()));
    }

    let order = state.store().orders.create(ctx.tenant_id(), new).await?;

    Ok((StatusCode::CREATED, Json(order)))
}

async fn list(State(state): State<AppState>, ctx: TenantContext) -> Result<Json<Vec<Order>>> {
    let orders = state.store().orders.list(ctx.tenant_id()).await?;
    Ok(Json(orders))
}

async fn fetch(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = state
        .store()
        .orders
        .find(ctx.tenant_id(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_owned()))?;

    Ok(Json(order))
}

async fn update(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<OrderId>,
    Json(update): Json<OrderUpdate>,
) -> Result<Json<Order>> {
    let order = state
        .store()
        .orders
        .update(ctx.tenant_id(), id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_owned()))?;

    Ok(Json(order))
}

async fn remove(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<OrderId>,
) -> Result<StatusCode> {
    let order = state
        .store()
        .orders
        .delete(ctx.tenant_id(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_owned()))?;

    for blob in order.style_pictures.iter().chain(order.sketches.iter()) {
        delete_best_effort(state.blobs().as_ref(), blob).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn upload_style_picture(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<OrderId>,
    multipart: Multipart,
) -> Result<Json<BlobRef>> {
    let (bytes, content_type) = read_upload(multipart).await?;
    let blob = state.blobs().put(bytes, "styles", &content_type).await?;

    let attached = state
        .store()
        .orders
        .add_style_picture(ctx.tenant_id(), id, &blob)
        .await?;

    if !attached {
        // The order vanished (or belongs to someone else); don't leak the
        // uploaded blob.
        delete_best_effort(state.blobs().as_ref(), &blob).await;
        return Err(AppError::NotFound("order".to_owned()));
    }

    Ok(Json(blob))
}

async fn upload_sketch(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<OrderId>,
    multipart: Multipart,
) -> Result<Json<BlobRef>> {
    let (bytes, content_type) = read_upload(multipart).await?;
    let blob = state.blobs().put(bytes, "sketches", &content_type).await?;

    let attached = state
        .store()
        .orders
        .add_sketch(ctx.tenant_id(), id, &blob)
        .await?;

    if !attached {
        delete_best_effort(state.blobs().as_ref(), &blob).await;
        return Err(AppError::NotFound("order".to_owned()));
    }

    Ok(Json(blob))
}
