use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::password::{check_password_policy, hash_password_with_cost, verify_password};
use crate::domain::category;
use crate::domain::errors::{AppError, AppResult, FieldError, StoreError};
use crate::domain::repositories::{SessionStore, UserRepository};
use crate::domain::user::value_objects::normalize_document_number;
use crate::domain::user::{
    DocumentType, Email, Location, PlanStatus, PlanType, ProviderData, User,
};
use crate::state::AppState;

/// Body of `POST /auth/register`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Provider attributes as submitted at registration or upgrade
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInput {
    pub document_type: DocumentType,
    #[serde(default)]
    pub document_number: String,
    pub speciality: Option<String>,
    pub description: Option<String>,
    #[serde(flatten)]
    pub location: Location,
    #[serde(default)]
    pub categories: Vec<String>,
    pub phone_number: Option<String>,
    pub plan_type: PlanType,
}

/// Body of `POST /auth/register-provider`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterProviderInput {
    #[serde(flatten)]
    pub account: RegisterInput,
    #[serde(flatten)]
    pub provider: ProviderInput,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ProviderInput {
    /// Validates provider fields, pushing violations into `errors`
    fn validate(self, errors: &mut Vec<FieldError>) -> Option<ProviderData> {
        let before = errors.len();

        let document_number =
            match normalize_document_number(self.document_type, &self.document_number) {
                Ok(number) => number,
                Err(msg) => {
                    errors.push(FieldError::new("documentNumber", msg));
                    String::new()
                }
            };

        let mut categories = BTreeSet::new();
        for id in self.categories {
            let id = id.trim().to_lowercase();
            if category::find(&id).is_none() {
                errors.push(FieldError::new(
                    "categories",
                    format!("Unknown category: {}", id),
                ));
            }
            categories.insert(id);
        }

        if errors.len() > before {
            return None;
        }

        Some(ProviderData {
            document_type: self.document_type,
            document_number,
            speciality: non_blank(self.speciality),
            description: non_blank(self.description),
            location: self.location,
            categories,
            phone_number: non_blank(self.phone_number),
            plan_type: self.plan_type,
        })
    }
}

/// Registration, login and account upgrades
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionStore>,
    bcrypt_cost: u32,
}

impl AccountService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: Arc::clone(&state.users),
            sessions: Arc::clone(&state.sessions),
            bcrypt_cost: state.config.bcrypt_cost,
        }
    }

    fn validate_account(input: &RegisterInput, errors: &mut Vec<FieldError>) -> Option<Email> {
        if input.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        if let Err(msg) = check_password_policy(&input.password) {
            errors.push(FieldError::new("password", msg));
        }
        match Email::new(&input.email) {
            Ok(email) => Some(email),
            Err(msg) => {
                errors.push(FieldError::new("email", msg));
                None
            }
        }
    }

    async fn insert_and_login(&self, user: User) -> AppResult<(User, String)> {
        self.users.create(&user).await.map_err(|e| match e {
            StoreError::Conflict(_) => AppError::invalid("email", "Email already registered"),
            other => other.into(),
        })?;

        let token = self.sessions.create(user.clone()).await;
        tracing::info!(user_id = %user.id, user_type = %user.user_type(), "user registered");
        Ok((user, token))
    }

    fn hash(&self, password: &str) -> AppResult<String> {
        hash_password_with_cost(password, self.bcrypt_cost)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Registers a viewer account and opens a session for it
    pub async fn register_viewer(&self, input: RegisterInput) -> AppResult<(User, String)> {
        let mut errors = Vec::new();
        let email = Self::validate_account(&input, &mut errors);
        let email = match email {
            Some(email) if errors.is_empty() => email,
            _ => return Err(AppError::Validation(errors)),
        };

        let user = User::new_viewer(email, self.hash(&input.password)?, input.name.trim().to_string());
        self.insert_and_login(user).await
    }

    /// Registers a provider account; the plan waits for payment
    pub async fn register_provider(&self, input: RegisterProviderInput) -> AppResult<(User, String)> {
        let mut errors = Vec::new();
        let email = Self::validate_account(&input.account, &mut errors);
        let provider = input.provider.validate(&mut errors);
        let (email, provider) = match (email, provider) {
            (Some(email), Some(provider)) if errors.is_empty() => (email, provider),
            _ => return Err(AppError::Validation(errors)),
        };

        let mut user = User::new_viewer(
            email,
            self.hash(&input.account.password)?,
            input.account.name.trim().to_string(),
        );
        user.become_provider(provider, PlanStatus::Pending)
            .map_err(|_| AppError::Internal("Fresh account already a provider".to_string()))?;

        self.insert_and_login(user).await
    }

    /// Checks credentials and opens a session
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(User, String)> {
        let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

        let email = Email::new(email).map_err(|_| invalid())?;
        let user = self.users.find_by_email(&email).await?.ok_or_else(invalid)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            tracing::warn!(user_id = %user.id, "failed login attempt");
            return Err(invalid());
        }
        if !user.is_active {
            return Err(AppError::Unauthorized("Account is disabled".to_string()));
        }

        let token = self.sessions.create(user.clone()).await;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok((user, token))
    }

    /// Ends a session
    pub async fn logout(&self, token: &str) {
        self.sessions.delete(token).await;
    }

    /// Converts a viewer into a provider
    ///
    /// The plan starts `Pending` unless `activate` is set by the post-payment
    /// flow. Live sessions of the user pick up the new role.
    ///
    /// # Errors
    /// * `InvalidState` - the user already is a provider
    /// * `Validation` - provider fields are invalid
    pub async fn upgrade_to_provider(
        &self,
        user_id: Uuid,
        input: ProviderInput,
        activate: bool,
    ) -> AppResult<User> {
        let status = if activate {
            PlanStatus::Active
        } else {
            PlanStatus::Pending
        };

        let user = self
            .users
            .modify(
                user_id,
                Box::new(move |user| {
                    if user.provider().is_some() {
                        return Err(AppError::InvalidState(
                            "User is already a provider".to_string(),
                        ));
                    }

                    let mut errors = Vec::new();
                    let data = input
                        .validate(&mut errors)
                        .ok_or(AppError::Validation(errors))?;

                    user.become_provider(data, status).map_err(|_| {
                        AppError::InvalidState("User is already a provider".to_string())
                    })
                }),
            )
            .await?;
        self.sessions.update_user(&user).await;

        tracing::info!(user_id = %user.id, plan_status = %status, "user upgraded to provider");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::infrastructure::payments::MockPaymentProcessor;

    fn state() -> AppState {
        AppState::in_memory(AppConfig::test(), Arc::new(MockPaymentProcessor::new()))
    }

    fn register_input(email: &str) -> RegisterInput {
        RegisterInput {
            name: "Ana".to_string(),
            email: email.to_string(),
            password: "segredo123".to_string(),
        }
    }

    fn provider_input(document_type: DocumentType, number: &str) -> ProviderInput {
        ProviderInput {
            document_type,
            document_number: number.to_string(),
            speciality: Some("Vendas".to_string()),
            description: None,
            location: Location::default(),
            categories: vec!["imobiliaria".to_string()],
            phone_number: None,
            plan_type: PlanType::B,
        }
    }

    #[tokio::test]
    async fn register_creates_viewer_with_session() {
        let state = state();
        let service = AccountService::new(&state);

        let (user, token) = service.register_viewer(register_input("ana@example.com")).await.unwrap();

        assert_eq!(user.user_type(), crate::domain::user::UserType::Viewer);
        assert_eq!(state.sessions.get(&token).await.unwrap().user_id, user.id);
    }

    #[tokio::test]
    async fn register_reports_every_invalid_field() {
        let service = AccountService::new(&state());

        let err = service
            .register_viewer(RegisterInput {
                name: " ".to_string(),
                email: "bad".to_string(),
                password: "short".to_string(),
            })
            .await
            .unwrap_err();

        match err {
            AppError::Validation(errors) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_validation_error() {
        let service = AccountService::new(&state());
        service.register_viewer(register_input("ana@example.com")).await.unwrap();

        let err = service
            .register_viewer(register_input("ANA@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(ref e) if e[0].field == "email"));
    }

    #[tokio::test]
    async fn login_checks_password() {
        let service = AccountService::new(&state());
        service.register_viewer(register_input("ana@example.com")).await.unwrap();

        assert!(service.login("ana@example.com", "segredo123").await.is_ok());
        assert!(matches!(
            service.login("ana@example.com", "wrong-password").await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            service.login("nobody@example.com", "segredo123").await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn register_provider_starts_pending() {
        let service = AccountService::new(&state());

        let (user, _) = service
            .register_provider(RegisterProviderInput {
                account: register_input("imob@example.com"),
                provider: provider_input(DocumentType::Cnpj, "12.345.678/0001-95"),
            })
            .await
            .unwrap();

        let profile = user.provider().unwrap();
        assert_eq!(profile.plan_status, PlanStatus::Pending);
        assert_eq!(profile.document_number, "12345678000195");
        assert!(profile.is_real_estate());
    }

    #[tokio::test]
    async fn register_provider_rejects_short_document_and_unknown_category() {
        let service = AccountService::new(&state());
        let mut provider = provider_input(DocumentType::Cnpj, "123");
        provider.categories.push("astronauta".to_string());

        let err = service
            .register_provider(RegisterProviderInput {
                account: register_input("imob@example.com"),
                provider,
            })
            .await
            .unwrap_err();

        match err {
            AppError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["documentNumber", "categories"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn upgrade_twice_is_invalid_state() {
        let service = AccountService::new(&state());
        let (user, _) = service.register_viewer(register_input("ana@example.com")).await.unwrap();

        let upgraded = service
            .upgrade_to_provider(user.id, provider_input(DocumentType::Cpf, "12345678909"), false)
            .await
            .unwrap();
        assert_eq!(upgraded.provider().unwrap().plan_status, PlanStatus::Pending);

        let again = service
            .upgrade_to_provider(user.id, provider_input(DocumentType::Cpf, "12345678909"), false)
            .await;
        assert!(matches!(again, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn upgrade_from_payment_flow_is_active() {
        let service = AccountService::new(&state());
        let (user, _) = service.register_viewer(register_input("ana@example.com")).await.unwrap();

        let upgraded = service
            .upgrade_to_provider(user.id, provider_input(DocumentType::Cnpj, "12345678000195"), true)
            .await
            .unwrap();

        assert_eq!(upgraded.provider().unwrap().plan_status, PlanStatus::Active);
    }

    #[tokio::test]
    async fn concurrent_upgrades_let_exactly_one_through() {
        let state = state();
        let (user, _) = AccountService::new(&state)
            .register_viewer(register_input("ana@example.com"))
            .await
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = state.clone();
                tokio::spawn(async move {
                    AccountService::new(&state)
                        .upgrade_to_provider(
                            user.id,
                            provider_input(DocumentType::Cpf, "12345678909"),
                            false,
                        )
                        .await
                })
            })
            .collect();

        let mut upgraded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => upgraded += 1,
                Err(err) => assert!(matches!(err, AppError::InvalidState(_))),
            }
        }
        assert_eq!(upgraded, 1);
    }
}
