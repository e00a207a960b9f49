use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::RequireAuth;
use crate::domain::subscription::Subscription;
use crate::domain::user::PlanType;
use crate::services::{PaymentStarted, SubscriptionService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub plan_type: PlanType,
}

/// Payment notification; only the intent id is read from it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWebhook {
    pub payment_intent_id: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub success: bool,
    pub subscription: Subscription,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionListResponse {
    pub success: bool,
    pub subscriptions: Vec<Subscription>,
}

/// Start paying for a plan
///
/// POST /create-subscription
pub async fn create_subscription(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    payload: Result<Json<CreateSubscriptionRequest>, JsonRejection>,
) -> Result<Json<PaymentStarted>, ApiError> {
    let Json(req) = payload?;
    let started = SubscriptionService::new(&state)
        .start_payment(&ctx.user, req.plan_type)
        .await?;

    Ok(Json(started))
}

/// Payment processor callback, safe to redeliver
///
/// POST /webhooks/payment
pub async fn payment_webhook(
    State(state): State<AppState>,
    payload: Result<Json<PaymentWebhook>, JsonRejection>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let Json(req) = payload?;
    let subscription = SubscriptionService::new(&state)
        .confirm_payment(&req.payment_intent_id)
        .await?;

    Ok(Json(SubscriptionResponse {
        success: true,
        subscription,
    }))
}

/// GET /subscriptions
pub async fn list_subscriptions(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
) -> Result<Json<SubscriptionListResponse>, ApiError> {
    let subscriptions = SubscriptionService::new(&state)
        .list_for_user(&ctx.user, Utc::now())
        .await?;

    Ok(Json(SubscriptionListResponse {
        success: true,
        subscriptions,
    }))
}

/// Request cancellation within the free-cancellation window
///
/// POST /subscriptions/:id/cancel
pub async fn cancel_subscription(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let Path(id) = id?;
    let subscription = SubscriptionService::new(&state)
        .cancel(ctx.user.id, id, Utc::now())
        .await?;

    Ok(Json(SubscriptionResponse {
        success: true,
        subscription,
    }))
}
