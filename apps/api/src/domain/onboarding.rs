//! Provider onboarding progress
//!
//! Onboarding has no stored state. Each step is judged from the fields
//! currently present on the user and provider profile, so the report must be
//! rebuilt on every read.

use serde::Serialize;

use super::user::{ProviderProfile, User};

/// Completion percentage at which the dashboard switches from the guided
/// checklist to the full management view
pub const ONBOARDING_THRESHOLD: u8 = 80;

/// Owned listings needed to complete the properties step
pub const REQUIRED_PROPERTY_COUNT: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnboardingStep {
    BasicInfo,
    Address,
    Documents,
    Categories,
    Portfolio,
    Properties,
}

impl OnboardingStep {
    /// Steps in recommendation order
    pub const ALL: [OnboardingStep; 6] = [
        OnboardingStep::BasicInfo,
        OnboardingStep::Address,
        OnboardingStep::Documents,
        OnboardingStep::Categories,
        OnboardingStep::Portfolio,
        OnboardingStep::Properties,
    ];

    pub fn weight(&self) -> u32 {
        match self {
            OnboardingStep::BasicInfo => 20,
            OnboardingStep::Address => 15,
            OnboardingStep::Documents => 20,
            OnboardingStep::Categories => 25,
            OnboardingStep::Portfolio => 20,
            OnboardingStep::Properties => 10,
        }
    }

    pub fn required(&self) -> bool {
        !matches!(self, OnboardingStep::Portfolio | OnboardingStep::Properties)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepStatus {
    pub step: OnboardingStep,
    pub weight: u32,
    pub required: bool,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingReport {
    /// Applicable steps only
    pub steps: Vec<StepStatus>,
    pub completion_percentage: u8,
    pub next_step: Option<OnboardingStep>,
    pub onboarding_complete: bool,
}

fn filled(value: &str) -> bool {
    !value.trim().is_empty()
}

fn filled_opt(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(filled)
}

fn step_complete(
    step: OnboardingStep,
    user: &User,
    profile: &ProviderProfile,
    owned_properties: u64,
) -> bool {
    match step {
        OnboardingStep::BasicInfo => {
            filled(&user.name) && filled_opt(&user.profile_image_url) && filled(user.email.as_str())
        }
        OnboardingStep::Address => profile.location.is_complete(),
        OnboardingStep::Documents => filled(&profile.document_number) && profile.documents_verified,
        OnboardingStep::Categories => !profile.categories.is_empty(),
        OnboardingStep::Portfolio => {
            filled_opt(&profile.description) && !profile.portfolio_images.is_empty()
        }
        OnboardingStep::Properties => owned_properties >= REQUIRED_PROPERTY_COUNT,
    }
}

/// Builds the onboarding report for a provider
///
/// `owned_properties` is only consulted when the properties step applies
/// (Plan B providers in the real-estate category).
pub fn evaluate(user: &User, profile: &ProviderProfile, owned_properties: u64) -> OnboardingReport {
    let steps: Vec<StepStatus> = OnboardingStep::ALL
        .iter()
        .copied()
        .filter(|step| *step != OnboardingStep::Properties || profile.lists_properties())
        .map(|step| StepStatus {
            step,
            weight: step.weight(),
            required: step.required(),
            complete: step_complete(step, user, profile, owned_properties),
        })
        .collect();

    let total: u32 = steps.iter().map(|s| s.weight).sum();
    let done: u32 = steps.iter().filter(|s| s.complete).map(|s| s.weight).sum();
    let completion_percentage = percentage(done, total);

    OnboardingReport {
        next_step: steps.iter().find(|s| !s.complete).map(|s| s.step),
        completion_percentage,
        onboarding_complete: completion_percentage >= ONBOARDING_THRESHOLD,
        steps,
    }
}

/// round(100 * done / total), halves rounded up
fn percentage(done: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (200 * done + total) / (2 * total);
    pct.min(100) as u8
}
