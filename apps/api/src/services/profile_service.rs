use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::access::{require_plan_type, require_provider};
use crate::domain::category::{self, MAX_CATEGORIES_PLAN_B};
use crate::domain::errors::{AppError, AppResult, FieldError};
use crate::domain::onboarding::{self, OnboardingReport};
use crate::domain::property::value_objects::is_web_url;
use crate::domain::repositories::{PropertyRepository, SessionStore, UserEdit, UserRepository};
use crate::domain::user::value_objects::normalize_document_number;
use crate::domain::user::{
    DocumentType, Location, PlanType, User, MAX_PORTFOLIO_IMAGES, MAX_SUBCATEGORIES,
};
use crate::state::AppState;

/// Partial profile update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub profile_image_url: Option<String>,
    pub phone_number: Option<String>,
    pub speciality: Option<String>,
    pub description: Option<String>,
    pub location: Option<Location>,
    pub document_type: Option<DocumentType>,
    pub document_number: Option<String>,
    pub subcategories: Option<Vec<String>>,
    pub portfolio_images: Option<Vec<String>>,
}

impl ProfileUpdate {
    fn touches_provider_fields(&self) -> bool {
        self.speciality.is_some()
            || self.description.is_some()
            || self.location.is_some()
            || self.document_type.is_some()
            || self.document_number.is_some()
            || self.subcategories.is_some()
            || self.portfolio_images.is_some()
    }
}

/// An empty string clears an optional text field
fn optional_text(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn merge_profile(user: &mut User, update: ProfileUpdate) -> AppResult<()> {
    if update.touches_provider_fields() && user.provider().is_none() {
        return Err(AppError::Forbidden(
            "Only providers can edit provider details".to_string(),
        ));
    }

    let mut errors = Vec::new();

    if let Some(name) = update.name {
        match optional_text(name) {
            Some(name) => user.name = name,
            None => errors.push(FieldError::new("name", "Name cannot be empty")),
        }
    }
    if let Some(url) = update.profile_image_url {
        match optional_text(url) {
            Some(url) if !is_web_url(&url) => errors.push(FieldError::new(
                "profileImageUrl",
                "Profile image URL must be a valid URL",
            )),
            url => user.profile_image_url = url,
        }
    }
    if let Some(phone) = update.phone_number {
        user.phone_number = optional_text(phone);
    }

    if let Some(profile) = user.provider_mut() {
        if let Some(speciality) = update.speciality {
            profile.speciality = optional_text(speciality);
        }
        if let Some(description) = update.description {
            profile.description = optional_text(description);
        }
        if let Some(location) = update.location {
            profile.location = location;
        }

        if update.document_type.is_some() || update.document_number.is_some() {
            let document_type = update.document_type.unwrap_or(profile.document_type);
            let raw = update
                .document_number
                .unwrap_or_else(|| profile.document_number.clone());
            match normalize_document_number(document_type, &raw) {
                Ok(number) => {
                    if document_type != profile.document_type || number != profile.document_number {
                        profile.documents_verified = false;
                    }
                    profile.document_type = document_type;
                    profile.document_number = number;
                }
                Err(msg) => errors.push(FieldError::new("documentNumber", msg)),
            }
        }

        if let Some(subcategories) = update.subcategories {
            let subcategories: Vec<String> = subcategories
                .into_iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            if subcategories.len() > MAX_SUBCATEGORIES {
                errors.push(FieldError::new(
                    "subcategories",
                    format!("At most {} subcategories are allowed", MAX_SUBCATEGORIES),
                ));
            }
            for sub in &subcategories {
                if !category::allows_subcategory(&profile.categories, sub) {
                    errors.push(FieldError::new(
                        "subcategories",
                        format!("Subcategory '{}' does not belong to your categories", sub),
                    ));
                }
            }
            profile.subcategories = subcategories;
        }

        if let Some(images) = update.portfolio_images {
            if images.len() > MAX_PORTFOLIO_IMAGES {
                errors.push(FieldError::new(
                    "portfolioImages",
                    format!("At most {} portfolio images are allowed", MAX_PORTFOLIO_IMAGES),
                ));
            }
            for (index, image) in images.iter().enumerate() {
                if !is_web_url(image) {
                    errors.push(FieldError::new(
                        format!("portfolioImages[{}]", index),
                        "Image URL must be a valid URL",
                    ));
                }
            }
            profile.portfolio_images = images;
        }
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    Ok(())
}

fn replace_categories(user: &mut User, category_ids: Vec<String>) -> AppResult<()> {
    require_plan_type(user, PlanType::B)?;

    let mut categories = BTreeSet::new();
    let mut errors = Vec::new();
    for id in category_ids {
        let id = id.trim().to_lowercase();
        if category::find(&id).is_none() {
            errors.push(FieldError::new(
                "categoryIds",
                format!("Unknown category: {}", id),
            ));
        }
        categories.insert(id);
    }
    if categories.is_empty() {
        errors.push(FieldError::new(
            "categoryIds",
            "At least one category is required",
        ));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    if categories.len() > MAX_CATEGORIES_PLAN_B {
        return Err(AppError::PolicyViolation(format!(
            "Plan B allows at most {} categories",
            MAX_CATEGORIES_PLAN_B
        )));
    }

    if let Some(profile) = user.provider_mut() {
        profile
            .subcategories
            .retain(|sub| category::allows_subcategory(&categories, sub));
        profile.categories = categories;
    }

    Ok(())
}

/// Profile editing, category selection and onboarding progress
pub struct ProfileService {
    users: Arc<dyn UserRepository>,
    properties: Arc<dyn PropertyRepository>,
    sessions: Arc<dyn SessionStore>,
}

impl ProfileService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: Arc::clone(&state.users),
            properties: Arc::clone(&state.properties),
            sessions: Arc::clone(&state.sessions),
        }
    }

    /// Current onboarding progress of a provider
    pub async fn onboarding(&self, user: &User) -> AppResult<OnboardingReport> {
        let profile = require_provider(user)?;
        let owned = if profile.lists_properties() {
            self.properties.count_by_agency(user.id).await?
        } else {
            0
        };
        Ok(onboarding::evaluate(user, profile, owned))
    }

    /// Onboarding progress for providers, `None` for viewers
    pub async fn onboarding_if_provider(&self, user: &User) -> AppResult<Option<OnboardingReport>> {
        match user.provider() {
            Some(_) => self.onboarding(user).await.map(Some),
            None => Ok(None),
        }
    }

    async fn store(&self, user_id: Uuid, edit: UserEdit) -> AppResult<User> {
        let user = self.users.modify(user_id, edit).await?;
        self.sessions.update_user(&user).await;
        Ok(user)
    }

    /// Merges the given fields into the user's profile
    ///
    /// # Errors
    /// * `Forbidden` - provider-only fields sent by a viewer
    /// * `Validation` - every violated field constraint
    pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> AppResult<User> {
        let user = self
            .store(user_id, Box::new(move |user| merge_profile(user, update)))
            .await?;
        tracing::info!(user_id = %user.id, "profile updated");
        Ok(user)
    }

    /// Replaces the categories of a Plan B provider
    ///
    /// Subcategories that no longer belong to the new set are dropped.
    pub async fn set_categories(&self, user_id: Uuid, category_ids: Vec<String>) -> AppResult<User> {
        let user = self
            .store(
                user_id,
                Box::new(move |user| replace_categories(user, category_ids)),
            )
            .await?;
        tracing::info!(user_id = %user.id, "categories updated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::domain::onboarding::OnboardingStep;
    use crate::domain::user::{Email, PlanStatus, ProviderData};
    use crate::infrastructure::payments::MockPaymentProcessor;

    async fn setup(account: Option<PlanType>) -> (AppState, User) {
        let state = AppState::in_memory(AppConfig::test(), Arc::new(MockPaymentProcessor::new()));
        let mut user = User::new_viewer(
            Email::new("p@example.com").unwrap(),
            "hash".to_string(),
            "Paulo".to_string(),
        );
        if let Some(plan_type) = account {
            user.become_provider(
                ProviderData {
                    document_type: DocumentType::Cpf,
                    document_number: "12345678909".to_string(),
                    speciality: None,
                    description: None,
                    location: Location::default(),
                    categories: ["eletricista".to_string()].into_iter().collect(),
                    phone_number: None,
                    plan_type,
                },
                PlanStatus::Active,
            )
            .unwrap();
        }
        state.users.create(&user).await.unwrap();
        (state, user)
    }

    fn first_subcategory(id: &str) -> String {
        category::find(id).unwrap().subcategories[0].to_string()
    }

    #[tokio::test]
    async fn viewer_cannot_send_provider_fields() {
        let (state, user) = setup(None).await;
        let service = ProfileService::new(&state);

        let err = service
            .update_profile(
                user.id,
                ProfileUpdate {
                    description: Some("Eletricista".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let updated = service
            .update_profile(
                user.id,
                ProfileUpdate {
                    name: Some("Paula".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Paula");
    }

    #[tokio::test]
    async fn portfolio_is_capped() {
        let (state, user) = setup(Some(PlanType::A)).await;
        let service = ProfileService::new(&state);
        let images = (0..=MAX_PORTFOLIO_IMAGES)
            .map(|i| format!("https://cdn.example.com/{}.jpg", i))
            .collect();

        let err = service
            .update_profile(
                user.id,
                ProfileUpdate {
                    portfolio_images: Some(images),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(ref e) if e[0].field == "portfolioImages"));
    }

    #[tokio::test]
    async fn subcategories_must_match_categories() {
        let (state, user) = setup(Some(PlanType::A)).await;
        let service = ProfileService::new(&state);

        let err = service
            .update_profile(
                user.id,
                ProfileUpdate {
                    subcategories: Some(vec![first_subcategory("buffet")]),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let ok = service
            .update_profile(
                user.id,
                ProfileUpdate {
                    subcategories: Some(vec![first_subcategory("eletricista")]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(ok.provider().unwrap().subcategories.len(), 1);
    }

    #[tokio::test]
    async fn changing_document_clears_verification() {
        let (state, mut user) = setup(Some(PlanType::A)).await;
        user.provider_mut().unwrap().documents_verified = true;
        state.users.update(&user).await.unwrap();
        let service = ProfileService::new(&state);

        let updated = service
            .update_profile(
                user.id,
                ProfileUpdate {
                    document_type: Some(DocumentType::Cnpj),
                    document_number: Some("12.345.678/0001-95".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let profile = updated.provider().unwrap();
        assert_eq!(profile.document_type, DocumentType::Cnpj);
        assert!(!profile.documents_verified);
    }

    #[tokio::test]
    async fn plan_a_cannot_pick_categories() {
        let (state, user) = setup(Some(PlanType::A)).await;
        let err = ProfileService::new(&state)
            .set_categories(user.id, vec!["pintor".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn plan_b_category_rules() {
        let (state, user) = setup(Some(PlanType::B)).await;
        let service = ProfileService::new(&state);

        assert!(matches!(
            service.set_categories(user.id, vec![]).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service
                .set_categories(user.id, vec!["astronauta".to_string()])
                .await,
            Err(AppError::Validation(_))
        ));

        let six: Vec<String> = category::all()
            .iter()
            .take(MAX_CATEGORIES_PLAN_B + 1)
            .map(|c| c.id.to_string())
            .collect();
        assert!(matches!(
            service.set_categories(user.id, six).await,
            Err(AppError::PolicyViolation(_))
        ));
    }

    #[tokio::test]
    async fn replacing_categories_drops_orphaned_subcategories() {
        let (state, user) = setup(Some(PlanType::B)).await;
        let service = ProfileService::new(&state);
        service
            .update_profile(
                user.id,
                ProfileUpdate {
                    subcategories: Some(vec![first_subcategory("eletricista")]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let updated = service
            .set_categories(user.id, vec!["imobiliaria".to_string(), "pintor".to_string()])
            .await
            .unwrap();

        let profile = updated.provider().unwrap();
        assert!(profile.is_real_estate());
        assert!(profile.subcategories.is_empty());
    }

    #[tokio::test]
    async fn onboarding_counts_properties_for_realtors_only() {
        let (state, user) = setup(Some(PlanType::B)).await;
        let service = ProfileService::new(&state);

        let report = service.onboarding(&user).await.unwrap();
        assert!(report.steps.iter().all(|s| s.step != OnboardingStep::Properties));

        let user = service
            .set_categories(user.id, vec!["imobiliaria".to_string()])
            .await
            .unwrap();
        let report = service.onboarding(&user).await.unwrap();
        assert!(report.steps.iter().any(|s| s.step == OnboardingStep::Properties));
    }

    #[tokio::test]
    async fn viewers_have_no_onboarding() {
        let (state, user) = setup(None).await;
        let service = ProfileService::new(&state);
        assert!(service.onboarding_if_provider(&user).await.unwrap().is_none());
        assert!(matches!(service.onboarding(&user).await, Err(AppError::Forbidden(_))));
    }
}
