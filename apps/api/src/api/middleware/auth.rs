use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;

use crate::api::errors::ApiError;
use crate::auth::session_token::parse_bearer;
use crate::domain::access::{require_provider, require_real_estate_provider};
use crate::domain::errors::AppError;
use crate::domain::user::User;
use crate::services::SubscriptionService;
use crate::state::AppState;

/// Identity resolved from a bearer session token
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub token: String,
    pub user: User,
}

/// Session authentication extractor for protected routes
///
/// The session only carries the user id that matters; the user record is
/// re-read on every request so role and plan changes apply immediately.
///
/// Usage:
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(ctx): RequireAuth,
/// ) -> Result<String, ApiError> {
///     Ok(format!("Hello {}", ctx.user.name))
/// }
/// ```
pub struct RequireAuth(pub AuthContext);

/// Rejects viewers with `403`; the plan is reconciled with the
/// subscription record before the handler runs
pub struct RequireProvider(pub AuthContext);

/// Only providers in the real-estate category with an active plan
pub struct RequireRealEstateProvider(pub AuthContext);

#[async_trait]
impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

        let token = parse_bearer(header).ok_or_else(|| {
            ApiError::unauthorized("Invalid authorization format. Use: Bearer <token>")
        })?;

        let session = state
            .sessions
            .get(token)
            .await
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

        let user = state
            .users
            .find_by_id(session.user_id)
            .await
            .map_err(AppError::from)?
            .filter(|user| user.is_active);

        let Some(user) = user else {
            state.sessions.delete(token).await;
            return Err(ApiError::unauthorized("Account is no longer available"));
        };

        if user != session.user {
            state.sessions.update(token, user.clone()).await;
        }

        Ok(RequireAuth(AuthContext {
            token: token.to_string(),
            user,
        }))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequireProvider {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let RequireAuth(mut ctx) = RequireAuth::from_request_parts(parts, state).await?;
        require_provider(&ctx.user)?;

        ctx.user = SubscriptionService::new(state)
            .reconcile(ctx.user, Utc::now())
            .await?;

        Ok(RequireProvider(ctx))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequireRealEstateProvider {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let RequireProvider(ctx) = RequireProvider::from_request_parts(parts, state).await?;
        if let Err(err) = require_real_estate_provider(&ctx.user) {
            tracing::debug!(user_id = %ctx.user.id, reason = %err, "real-estate gate refused");
            return Err(err.into());
        }
        Ok(RequireRealEstateProvider(ctx))
    }
}
