//! Role and plan gates
//!
//! Pure checks behind the request extractors in `api::middleware::auth`.
//! An authenticated user that lacks a capability always gets `Forbidden`;
//! `Unauthorized` is reserved for missing or unknown sessions.

use super::errors::AppError;
use super::user::{PlanStatus, PlanType, ProviderProfile, User, REAL_ESTATE_CATEGORY};

/// The user must hold a provider account
pub fn require_provider(user: &User) -> Result<&ProviderProfile, AppError> {
    user.provider()
        .ok_or_else(|| AppError::Forbidden("Provider account required".to_string()))
}

/// The provider must list real estate and have an active plan
///
/// The category is checked before the plan, so a provider failing both is
/// told about the category.
pub fn require_real_estate_provider(user: &User) -> Result<&ProviderProfile, AppError> {
    let profile = require_provider(user)?;
    if !profile.categories.contains(REAL_ESTATE_CATEGORY) {
        return Err(AppError::Forbidden(format!(
            "Only providers in the '{}' category can manage properties",
            REAL_ESTATE_CATEGORY
        )));
    }
    if profile.plan_status != PlanStatus::Active {
        return Err(AppError::Forbidden(format!(
            "An active plan is required (current plan status: {})",
            profile.plan_status
        )));
    }
    Ok(profile)
}

/// The provider must be on the given plan tier
pub fn require_plan_type(user: &User, plan_type: PlanType) -> Result<&ProviderProfile, AppError> {
    let profile = require_provider(user)?;
    if profile.plan_type != plan_type {
        return Err(AppError::Forbidden(format!(
            "This feature requires plan {}",
            plan_type
        )));
    }
    Ok(profile)
}
