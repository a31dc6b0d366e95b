//! Authentication routes.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, Result};
use crate::middleware::auth::{clear_current_tenant, set_current_tenant};
use crate::models::{CurrentTenant, Tenant};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

#[derive(Debug, Deserialize)]
struct SignupRequest {
    phone: String,
    password: String,
    business_name: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    phone: String,
    password: String,
}

fn to_current(tenant: &Tenant) -> CurrentTenant {
    CurrentTenant {
        id: tenant.id,
        phone: tenant.phone.clone(),
        business_name: tenant.business_name.clone(),
        is_admin: tenant.is_admin,
    }
}

async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse> {
    let tenant = state
        .auth()
        .signup(&req.phone, &req.password, &req.business_name, Utc::now())
        .await?;

    let current = to_current(&tenant);
    set_current_tenant(&session, &current)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(current)))
}

async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let tenant = state.auth().login(&req.phone, &req.password).await?;

    let current = to_current(&tenant);
    set_current_tenant(&session, &current)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(current))
}

async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_tenant(&session)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(StatusCode::NO_CONTENT)
}
