//! Subscription routes: status query, plan catalogue, payment flow.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stitchdesk_core::{PaymentStatus, SubscriptionTier, SubscriptionWindow};

use crate::error::{AppError, Result};
use crate::middleware::TenantContext;
use crate::models::{PendingPayment, Tenant};
use crate::services::payments::ChargeRequest;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/subscription", get(status))
        .route("/subscription/plans", get(plans))
        .route("/subscription/pay", post(pay))
        .route("/subscription/verify", get(verify))
}

/// Subscription price for `tier`, in the configured currency.
fn plan_amount(tier: SubscriptionTier) -> Option<Decimal> {
    match tier {
        SubscriptionTier::Trial => None,
        SubscriptionTier::Monthly => Some(Decimal::from(5_000_u32)),
        SubscriptionTier::Quarterly => Some(Decimal::from(13_500_u32)),
        SubscriptionTier::Yearly => Some(Decimal::from(48_000_u32)),
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

async fn status(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> Result<Json<SubscriptionWindow>> {
    let tenant = load_tenant(&state, &ctx).await?;
    let window = state.subscriptions().evaluate(&tenant, Utc::now()).await?;

    Ok(Json(window))
}

#[derive(Debug, Serialize)]
struct Plan {
    tier: SubscriptionTier,
    amount: Decimal,
    currency: String,
    period_months: u32,
}

async fn plans(State(state): State<AppState>) -> Json<Vec<Plan>> {
    let currency = &state.config().payment.currency;

    let plans = [
        SubscriptionTier::Monthly,
        SubscriptionTier::Quarterly,
        SubscriptionTier::Yearly,
    ]
    .into_iter()
    .filter_map(|tier| {
        Some(Plan {
            tier,
            amount: plan_amount(tier)?,
            currency: currency.clone(),
            period_months: tier.period_months()?,
        })
    })
    .collect();

    Json(plans)
}

#[derive(Debug, Deserialize)]
struct PayRequest {
    tier: SubscriptionTier,
}

#[derive(Debug, Serialize)]
struct PayResponse {
    redirect_url: String,
    tx_ref: String,
}

async fn pay(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(req): Json<PayRequest>,
) -> Result<Json<PayResponse>> {
    let Some(amount) = plan_amount(req.tier) else {
        return Err(AppError::Validation(format!(
            "{} is not a payable tier",
            req.tier
        )));
    };

    let tenant = load_tenant(&state, &ctx).await?;
    let currency = state.config().payment.currency.clone();

    let charge = ChargeRequest {
        amount,
        currency: currency.clone(),
        phone: tenant.phone.clone(),
        business_name: tenant.business_name.clone(),
        tier: req.tier,
    };

    let initialized = state.payments().initialize(&charge).await?;

    let pending = PendingPayment {
        tx_ref: initialized.tx_ref.clone(),
        tier: req.tier,
        amount,
        currency,
        created_at: Utc::now(),
    };
    state
        .store()
        .tenants
        .set_pending_payment(tenant.id, Some(&pending))
        .await?;

    Ok(Json(PayResponse {
        redirect_url: initialized.redirect_url,
        tx_ref: initialized.tx_ref,
    }))
}

#[derive(Debug, Deserialize)]
struct VerifyQuery {
    tx_ref: String,
}

#[derive(Debug, Serialize)]
struct VerifyResponse {
    status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    subscription: Option<SubscriptionWindow>,
}

async fn verify(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<VerifyResponse>> {
    let tenant = load_tenant(&state, &ctx).await?;

    // A second confirmation callback for an already-settled reference is a
    // no-op success.
    if tenant.has_payment(&query.tx_ref) {
        let window = state.subscriptions().evaluate(&tenant, Utc::now()).await?;
        return Ok(Json(VerifyResponse {
            status: PaymentStatus::Successful,
            subscription: Some(window),
        }));
    }

    let tier = tenant
        .pending_payment
        .as_ref()
        .filter(|p| p.tx_ref == query.tx_ref)
        .map(|p| p.tier)
        .ok_or_else(|| AppError::Validation("unknown transaction reference".to_owned()))?;

    let tx = state.payments().verify(&query.tx_ref).await?;

    match tx.status {
        PaymentStatus::Successful => {
            let now = Utc::now();
            state
                .subscriptions()
                .apply_payment(&tenant, tier, &tx, now)
                .await?;

            let tenant = load_tenant(&state, &ctx).await?;
            let window = state.subscriptions().evaluate(&tenant, now).await?;

            Ok(Json(VerifyResponse {
                status: PaymentStatus::Successful,
                subscription: Some(window),
            }))
        }
        PaymentStatus::Failed | PaymentStatus::Cancelled => {
            state
                .store()
                .tenants
                .set_pending_payment(tenant.id, None)
                .await?;

            Ok(Json(VerifyResponse {
                status: tx.status,
                subscription: None,
            }))
        }
        PaymentStatus::Pending => Ok(Json(VerifyResponse {
            status: PaymentStatus::Pending,
            subscription: None,
        })),
    }
}
