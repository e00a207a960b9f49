use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::middleware::{RequireAuth, RequireProvider};
use crate::domain::category::{self, ServiceCategory};
use crate::domain::onboarding::OnboardingReport;
use crate::domain::user::{User, UserView};
use crate::services::{ProfileService, ProfileUpdate};
use crate::state::AppState;

/// Profile with onboarding progress, recomputed on every read
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding: Option<OnboardingReport>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoriesRequest {
    #[serde(default)]
    pub category_ids: Vec<String>,
}

async fn profile_response(service: &ProfileService, user: &User) -> Result<Json<ProfileResponse>, ApiError> {
    let onboarding = service.onboarding_if_provider(user).await?;
    Ok(Json(ProfileResponse {
        success: true,
        user: UserView::from(user),
        onboarding,
    }))
}

/// GET /profile
pub async fn get_profile(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
) -> Result<Json<ProfileResponse>, ApiError> {
    profile_response(&ProfileService::new(&state), &ctx.user).await
}

/// PUT /profile
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let Json(update) = payload?;
    let service = ProfileService::new(&state);
    let user = service.update_profile(ctx.user.id, update).await?;

    profile_response(&service, &user).await
}

/// GET /provider/onboarding
pub async fn get_onboarding(
    State(state): State<AppState>,
    RequireProvider(ctx): RequireProvider,
) -> Result<Json<OnboardingReport>, ApiError> {
    let report = ProfileService::new(&state).onboarding(&ctx.user).await?;
    Ok(Json(report))
}

/// GET /categories
pub async fn list_categories() -> Json<&'static [ServiceCategory]> {
    Json(category::all())
}

/// PUT /user/categories
pub async fn set_categories(
    State(state): State<AppState>,
    RequireProvider(ctx): RequireProvider,
    payload: Result<Json<CategoriesRequest>, JsonRejection>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let Json(req) = payload?;
    let service = ProfileService::new(&state);
    let user = service.set_categories(ctx.user.id, req.category_ids).await?;

    profile_response(&service, &user).await
}
