use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::domain::errors::{AppError, AppResult, StoreError};
use crate::domain::payments::{is_valid_intent_id, PaymentIntentStatus, PaymentProcessor};
use crate::domain::repositories::{SessionStore, SubscriptionRepository, UserEdit, UserRepository};
use crate::domain::subscription::{Subscription, SubscriptionEvent};
use crate::domain::user::{PlanStatus, PlanType, User};
use crate::state::AppState;

const META_USER_ID: &str = "user_id";
const META_PLAN_TYPE: &str = "plan_type";

/// Result of starting a plan payment
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStarted {
    pub client_secret: String,
    pub payment_intent_id: String,
    pub amount: Decimal,
}

/// Plan payments and the subscription lifecycle
pub struct SubscriptionService {
    config: Arc<AppConfig>,
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    sessions: Arc<dyn SessionStore>,
    payments: Arc<dyn PaymentProcessor>,
}

fn log_events(events: &[SubscriptionEvent]) {
    for event in events {
        match event {
            SubscriptionEvent::Activated {
                subscription_id,
                user_id,
                plan_type,
            } => tracing::info!(%subscription_id, %user_id, %plan_type, "subscription activated"),
            SubscriptionEvent::CancellationRequested {
                subscription_id,
                effective_at,
            } => tracing::info!(%subscription_id, %effective_at, "subscription cancellation requested"),
            SubscriptionEvent::Cancelled {
                subscription_id,
                user_id,
            } => tracing::info!(%subscription_id, %user_id, "subscription cancelled"),
            SubscriptionEvent::Renewed {
                subscription_id,
                period_end,
            } => tracing::info!(%subscription_id, %period_end, "subscription renewed"),
        }
    }
}

impl SubscriptionService {
    pub fn new(state: &AppState) -> Self {
        Self {
            config: Arc::clone(&state.config),
            users: Arc::clone(&state.users),
            subscriptions: Arc::clone(&state.subscriptions),
            sessions: Arc::clone(&state.sessions),
            payments: Arc::clone(&state.payments),
        }
    }

    async fn load_user(&self, user_id: Uuid) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {}", user_id)))
    }

    async fn store_user(&self, user_id: Uuid, edit: UserEdit) -> AppResult<User> {
        let user = self.users.modify(user_id, edit).await?;
        self.sessions.update_user(&user).await;
        Ok(user)
    }

    /// Opens a payment intent for the plan's fixed price
    ///
    /// The processor is called first; a provider's plan only moves to
    /// `Pending` once it answered, so a failed call leaves the account as
    /// it was. A provider whose plan is active or still covered by a
    /// subscription keeps it until the new payment is confirmed. Viewers
    /// may pay before upgrading, their account is not touched.
    pub async fn start_payment(&self, user: &User, plan_type: PlanType) -> AppResult<PaymentStarted> {
        let now = Utc::now();
        let covered = match user.provider() {
            Some(_) => self
                .settled_subscriptions(user.id, now)
                .await?
                .iter()
                .any(|s| s.grants_access(now)),
            None => false,
        };

        let cents = self.config.pricing.cents(plan_type);
        let metadata = HashMap::from([
            (META_USER_ID.to_string(), user.id.to_string()),
            (META_PLAN_TYPE.to_string(), plan_type.to_string()),
        ]);

        let intent = self
            .payments
            .create_payment_intent(cents, &self.config.currency, metadata)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "payment intent creation failed");
                AppError::from(e)
            })?;

        if user.provider().is_some() && !covered {
            self.store_user(
                user.id,
                Box::new(move |user| {
                    if let Some(profile) = user.provider_mut() {
                        if profile.plan_status != PlanStatus::Active {
                            profile.plan_type = plan_type;
                            profile.plan_status = PlanStatus::Pending;
                        }
                    }
                    Ok(())
                }),
            )
            .await?;
        }

        tracing::info!(
            user_id = %user.id,
            payment_intent_id = %intent.id,
            %plan_type,
            amount = cents,
            "plan payment started"
        );

        Ok(PaymentStarted {
            client_secret: intent.client_secret,
            payment_intent_id: intent.id,
            amount: self.config.pricing.amount(plan_type),
        })
    }

    /// Activates the subscription's plan on a provider owner
    ///
    /// With `replace_active` unset an already active plan is kept, which
    /// makes repeated calls for the same subscription harmless.
    async fn apply_plan(&self, subscription: &Subscription, replace_active: bool) -> AppResult<()> {
        let plan_type = subscription.plan_type();
        self.store_user(
            subscription.user_id(),
            Box::new(move |user| {
                // a viewer's plan is applied when they upgrade with this payment
                if let Some(profile) = user.provider_mut() {
                    if replace_active || profile.plan_status != PlanStatus::Active {
                        profile.plan_type = plan_type;
                        profile.plan_status = PlanStatus::Active;
                    }
                }
                Ok(())
            }),
        )
        .await?;
        Ok(())
    }

    /// Redelivered notification: completes a plan activation that may have
    /// failed after the subscription was stored
    async fn confirm_again(&self, mut existing: Subscription) -> AppResult<Subscription> {
        let now = Utc::now();
        self.settle(&mut existing, now).await?;
        if existing.grants_access(now) {
            self.apply_plan(&existing, false).await?;
        }
        Ok(existing)
    }

    /// Handles a payment notification
    ///
    /// The intent is re-read from the processor; the notification body is
    /// only trusted for the intent id. Redelivery returns the subscription
    /// created the first time.
    pub async fn confirm_payment(&self, payment_intent_id: &str) -> AppResult<Subscription> {
        let payment_intent_id = payment_intent_id.trim();
        if payment_intent_id.is_empty() {
            return Err(AppError::invalid(
                "paymentIntentId",
                "Payment intent id is required",
            ));
        }
        if !is_valid_intent_id(payment_intent_id) {
            return Err(AppError::invalid(
                "paymentIntentId",
                "Payment intent id may only contain letters, digits and underscores",
            ));
        }

        if let Some(existing) = self
            .subscriptions
            .find_by_payment_intent(payment_intent_id)
            .await?
        {
            tracing::debug!(payment_intent_id, "payment already processed");
            return self.confirm_again(existing).await;
        }

        let intent = self
            .payments
            .retrieve_payment_intent(payment_intent_id)
            .await?;
        if intent.status != PaymentIntentStatus::Succeeded {
            return Err(AppError::PolicyViolation(format!(
                "Payment {} has not succeeded",
                intent.id
            )));
        }

        let user_id = intent
            .metadata
            .get(META_USER_ID)
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or_else(|| {
                AppError::PolicyViolation("Payment is not linked to an account".to_string())
            })?;
        let plan_type = intent
            .metadata
            .get(META_PLAN_TYPE)
            .and_then(|v| v.parse::<PlanType>().ok())
            .ok_or_else(|| AppError::PolicyViolation("Payment is not linked to a plan".to_string()))?;

        self.load_user(user_id).await?;

        let (subscription, event) = Subscription::activate(
            user_id,
            plan_type,
            intent.id.clone(),
            Decimal::new(intent.amount, 2),
            Utc::now(),
            self.config.billing,
        );

        match self.subscriptions.create(&subscription).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => {
                // concurrent delivery of the same notification won the insert
                let existing = self
                    .subscriptions
                    .find_by_payment_intent(&intent.id)
                    .await?
                    .ok_or_else(|| AppError::Internal("Subscription vanished".to_string()))?;
                return self.confirm_again(existing).await;
            }
            Err(e) => return Err(e.into()),
        }

        log_events(&[event]);
        self.apply_plan(&subscription, true).await?;
        Ok(subscription)
    }

    /// Applies due period-end transitions, persisting the ones that changed
    async fn settle(&self, subscription: &mut Subscription, now: DateTime<Utc>) -> AppResult<()> {
        let events = subscription.settle(now, self.config.billing);
        if !events.is_empty() {
            self.subscriptions.update(subscription).await?;
            log_events(&events);
        }
        Ok(())
    }

    async fn settled_subscriptions(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Subscription>> {
        let mut subscriptions = self.subscriptions.list_by_user(user_id).await?;
        for subscription in subscriptions.iter_mut() {
            self.settle(subscription, now).await?;
        }
        Ok(subscriptions)
    }

    /// Aligns an `Active` plan with the subscription record
    ///
    /// Once every subscription of the user stopped granting access the plan
    /// drops to `Inactive`. Accounts activated without any subscription are
    /// left alone, and so are `Pending` plans awaiting a payment.
    async fn sync_plan_status(
        &self,
        mut user: User,
        subscriptions: &[Subscription],
        now: DateTime<Utc>,
    ) -> AppResult<User> {
        let lapsed = !subscriptions.is_empty()
            && subscriptions.iter().all(|s| !s.grants_access(now));

        match user.provider() {
            Some(profile) if lapsed && profile.plan_status == PlanStatus::Active => {}
            _ => return Ok(user),
        }

        user = self
            .store_user(
                user.id,
                Box::new(|user| {
                    if let Some(profile) = user.provider_mut() {
                        if profile.plan_status == PlanStatus::Active {
                            profile.plan_status = PlanStatus::Inactive;
                        }
                    }
                    Ok(())
                }),
            )
            .await?;
        tracing::info!(user_id = %user.id, "plan lapsed");
        Ok(user)
    }

    /// Settles the user's subscriptions and returns the up-to-date user
    pub async fn reconcile(&self, user: User, now: DateTime<Utc>) -> AppResult<User> {
        if user.provider().is_none() {
            return Ok(user);
        }
        let subscriptions = self.settled_subscriptions(user.id, now).await?;
        self.sync_plan_status(user, &subscriptions, now).await
    }

    /// The user's subscriptions, newest first, with due transitions applied
    pub async fn list_for_user(&self, user: &User, now: DateTime<Utc>) -> AppResult<Vec<Subscription>> {
        let subscriptions = self.settled_subscriptions(user.id, now).await?;
        self.sync_plan_status(user.clone(), &subscriptions, now).await?;
        Ok(subscriptions)
    }

    /// Requests cancellation of one of the user's subscriptions
    ///
    /// Subscriptions of other users are reported as missing.
    pub async fn cancel(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Subscription> {
        let not_found = || AppError::NotFound(format!("Subscription not found: {}", subscription_id));

        let mut subscription = self
            .subscriptions
            .find_by_id(subscription_id)
            .await?
            .filter(|s| s.user_id() == user_id)
            .ok_or_else(not_found)?;

        self.settle(&mut subscription, now).await?;

        if let Some(event) = subscription.request_cancellation(now)? {
            self.subscriptions.update(&subscription).await?;
            log_events(&[event]);
        }

        Ok(subscription)
    }
}
