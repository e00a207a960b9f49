use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::middleware::RequireAuth;
use crate::domain::errors::AppError;
use crate::domain::user::{User, UserView};
use crate::services::{
    AccountService, ProviderInput, RegisterInput, RegisterProviderInput, SubscriptionService,
};
use crate::state::AppState;

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for upgrading a viewer
///
/// With `paymentIntentId` the plan paid for beforehand is activated right
/// away; without it the plan waits for payment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequest {
    #[serde(flatten)]
    pub provider: ProviderInput,
    pub payment_intent_id: Option<String>,
}

/// Response carrying a fresh session
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub success: bool,
    pub user: UserView,
    pub session_token: String,
}

impl SessionResponse {
    fn new(user: &User, session_token: String) -> Self {
        Self {
            success: true,
            user: UserView::from(user),
            session_token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Register a viewer account
///
/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let Json(req) = payload?;
    let (user, token) = AccountService::new(&state).register_viewer(req).await?;

    Ok((StatusCode::CREATED, Json(SessionResponse::new(&user, token))))
}

/// Register a provider account, plan pending payment
///
/// POST /auth/register-provider
pub async fn register_provider(
    State(state): State<AppState>,
    payload: Result<Json<RegisterProviderInput>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let Json(req) = payload?;
    let (user, token) = AccountService::new(&state).register_provider(req).await?;

    Ok((StatusCode::CREATED, Json(SessionResponse::new(&user, token))))
}

/// Login with email and password
///
/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(req) = payload?;
    let (user, token) = AccountService::new(&state)
        .login(&req.email, &req.password)
        .await?;

    Ok(Json(SessionResponse::new(&user, token)))
}

/// Turn the calling viewer into a provider
///
/// POST /auth/upgrade-to-provider
pub async fn upgrade_to_provider(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    payload: Result<Json<UpgradeRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(req) = payload?;
    let mut provider = req.provider;

    let activate = match req.payment_intent_id {
        Some(payment_intent_id) => {
            let subscription = SubscriptionService::new(&state)
                .confirm_payment(&payment_intent_id)
                .await?;
            if subscription.user_id() != ctx.user.id {
                return Err(AppError::Forbidden(
                    "Payment belongs to another account".to_string(),
                )
                .into());
            }
            provider.plan_type = subscription.plan_type();
            true
        }
        None => false,
    };

    let user = AccountService::new(&state)
        .upgrade_to_provider(ctx.user.id, provider, activate)
        .await?;

    Ok(Json(UserResponse {
        success: true,
        user: UserView::from(&user),
    }))
}

/// Current user
///
/// GET /auth/me
pub async fn me(RequireAuth(ctx): RequireAuth) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "user": UserView::from(&ctx.user) }))
}

/// End the current session
///
/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
) -> Json<SuccessResponse> {
    AccountService::new(&state).logout(&ctx.token).await;
    tracing::info!(user_id = %ctx.user.id, "user logged out");

    Json(SuccessResponse { success: true })
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
