//! Measurement routes.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};

use stitchdesk_core::{BlobRef, MeasurementId};

use crate::error::{AppError, Result};
use crate::middleware::TenantContext;
use crate::models::{Measurement, MeasurementUpdate, NewMeasurement};
use crate::routes::read_upload;
use crate::services::blobs::delete_best_effort;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/measurements", post(create))
        .route("/measurements", get(list))
        .route("/measurements/{id}", get(fetch))
        .route("/measurements/{id}", put(update))
        .route("/measurements/{id}", delete(remove))
        .route("/measurements/{id}/photo", post(upload_photo))
}

async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(new): Json<NewMeasurement>,
) -> Result<(StatusCode, Json<Measurement>)> {
    if new.label.trim().is_empty() {
        return Err(AppError::Validation("label cannot be empty".to_owned()));
    }

    // A customer link is only honored when the customer is actually owned by
    // the caller.
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

    let measurement = state
        .store()
        .measurements
        .create(ctx.tenant_id(), new)
        .await?;

    Ok((StatusCode::CREATED, Json(measurement)))
}

async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> Result<Json<Vec<Measurement>>> {
    let measurements = state.store().measurements.list(ctx.tenant_id()).await?;
    Ok(Json(measurements))
}

async fn fetch(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<MeasurementId>,
) -> Result<Json<Measurement>> {
    let measurement = state
        .store()
        .measurements
        .find(ctx.tenant_id(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("measurement".to_owned()))?;

    Ok(Json(measurement))
}

async fn update(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<MeasurementId>,
    Json(update): Json<MeasurementUpdate>,
) -> Result<Json<Measurement>> {
    let measurement = state
        .store()
        .measurements
        .update(ctx.tenant_id(), id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("measurement".to_owned()))?;

    Ok(Json(measurement))
}

async fn remove(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<MeasurementId>,
) -> Result<StatusCode> {
    let measurement = state
        .store()
        .measurements
        .delete(ctx.tenant_id(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("measurement".to_owned()))?;

    if let Some(photo) = &measurement.photo {
        delete_best_effort(state.blobs().as_ref(), photo).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn upload_photo(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<MeasurementId>,
    multipart: Multipart,
) -> Result<Json<BlobRef>> {
    let measurement = state
        .store()
        .measurements
        .find(ctx.tenant_id(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("measurement".to_owned()))?;

    let (bytes, content_type) = read_upload(multipart).await?;
    let blob = state
        .blobs()
        .put(bytes, "measurements", &content_type)
        .await?;

    if let Some(old) = &measurement.photo {
        delete_best_effort(state.blobs().as_ref(), old).await;
    }

    state
        .store()
        .measurements
        .set_photo(ctx.tenant_id(), id, Some(&blob))
        .await?;

    Ok(Json(blob))
}
