use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::value_objects::{DocumentType, Email, Location, PlanStatus, PlanType, UserType};

/// Category that unlocks property listings
pub const REAL_ESTATE_CATEGORY: &str = "imobiliaria";

/// Maximum number of portfolio images a provider may keep
pub const MAX_PORTFOLIO_IMAGES: usize = 10;

/// Maximum number of subcategories a provider may pick
pub const MAX_SUBCATEGORIES: usize = 3;

/// Marketplace account
///
/// The role is carried by [`Account`], so provider-only data can only be
/// reached after matching on `Account::Provider`.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: Email,
    pub password_hash: String,
    pub name: String,
    pub profile_image_url: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub account: Account,
}

/// Role-specific part of a user
#[derive(Debug, Clone, PartialEq)]
pub enum Account {
    Viewer,
    Provider(ProviderProfile),
}

/// Attributes layered onto a provider account
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderProfile {
    pub document_type: DocumentType,
    pub document_number: String,
    pub speciality: Option<String>,
    pub description: Option<String>,
    pub location: Location,
    pub categories: BTreeSet<String>,
    pub subcategories: Vec<String>,
    pub portfolio_images: Vec<String>,
    pub plan_type: PlanType,
    pub plan_status: PlanStatus,
    pub documents_verified: bool,
}

impl ProviderProfile {
    /// True when the provider lists the real-estate category
    pub fn is_real_estate(&self) -> bool {
        self.categories.contains(REAL_ESTATE_CATEGORY)
    }

    /// True when the conditional properties onboarding step applies
    pub fn lists_properties(&self) -> bool {
        self.plan_type == PlanType::B && self.is_real_estate()
    }
}

/// Provider data supplied at registration or upgrade time
#[derive(Debug, Clone)]
pub struct ProviderData {
    pub document_type: DocumentType,
    pub document_number: String,
    pub speciality: Option<String>,
    pub description: Option<String>,
    pub location: Location,
    pub categories: BTreeSet<String>,
    pub phone_number: Option<String>,
    pub plan_type: PlanType,
}

impl ProviderData {
    /// Builds the provider profile with the given initial plan status
    pub fn into_profile(self, plan_status: PlanStatus) -> ProviderProfile {
        ProviderProfile {
            document_type: self.document_type,
            document_number: self.document_number,
            speciality: self.speciality,
            description: self.description,
            location: self.location,
            categories: self.categories,
            subcategories: Vec::new(),
            portfolio_images: Vec::new(),
            plan_type: self.plan_type,
            plan_status,
            documents_verified: false,
        }
    }
}

impl User {
    /// Creates a fresh viewer account
    pub fn new_viewer(email: Email, password_hash: String, name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            name,
            profile_image_url: None,
            phone_number: None,
            is_active: true,
            created_at: Utc::now(),
            account: Account::Viewer,
        }
    }

    pub fn user_type(&self) -> UserType {
        match self.account {
            Account::Viewer => UserType::Viewer,
            Account::Provider(_) => UserType::Provider,
        }
    }

    pub fn provider(&self) -> Option<&ProviderProfile> {
        match &self.account {
            Account::Provider(profile) => Some(profile),
            Account::Viewer => None,
        }
    }

    pub fn provider_mut(&mut self) -> Option<&mut ProviderProfile> {
        match &mut self.account {
            Account::Provider(profile) => Some(profile),
            Account::Viewer => None,
        }
    }

    /// Turns a viewer into a provider
    ///
    /// # Errors
    /// Returns the current user type when the account is already a provider.
    pub fn become_provider(&mut self, data: ProviderData, plan_status: PlanStatus) -> Result<(), UserType> {
        if let Account::Provider(_) = self.account {
            return Err(UserType::Provider);
        }
        if data.phone_number.is_some() {
            self.phone_number = data.phone_number.clone();
        }
        self.account = Account::Provider(data.into_profile(plan_status));
        Ok(())
    }
}

/// Provider section of the public user view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderView {
    pub document_type: DocumentType,
    pub document_number: String,
    pub speciality: Option<String>,
    pub description: Option<String>,
    pub location: Location,
    pub categories: Vec<String>,
    pub subcategories: Vec<String>,
    pub portfolio_images: Vec<String>,
    pub plan_type: PlanType,
    pub plan_status: PlanStatus,
    pub documents_verified: bool,
}

/// Client-facing representation of a user (never exposes the password hash)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub user_type: UserType,
    pub profile_image_url: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderView>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.to_string(),
            name: user.name.clone(),
            user_type: user.user_type(),
            profile_image_url: user.profile_image_url.clone(),
            phone_number: user.phone_number.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
            provider: user.provider().map(|p| ProviderView {
                document_type: p.document_type,
                document_number: p.document_number.clone(),
                speciality: p.speciality.clone(),
                description: p.description.clone(),
                location: p.location.clone(),
                categories: p.categories.iter().cloned().collect(),
                subcategories: p.subcategories.clone(),
                portfolio_images: p.portfolio_images.clone(),
                plan_type: p.plan_type,
                plan_status: p.plan_status,
                documents_verified: p.documents_verified,
            }),
        }
    }
}
