use super::events::SubscriptionEvent;
use super::value_objects::{BillingTerms, SubscriptionStatus};
use crate::domain::errors::AppError;
use crate::domain::user::PlanType;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Subscription aggregate root
///
/// Created once a plan payment is confirmed. Tracks the billing period and
/// the free-cancellation window that opens at `start_date`.
///
/// # Invariants
/// - `cancellation_deadline = start_date + grace period`
/// - `end_date = start_date + billing period`
/// - Cancellation takes effect at `end_date`, never immediately
/// - Status transitions follow [`SubscriptionStatus::can_transition_to`]
///
/// # Example
/// ```
/// use chrono::Utc;
/// use marketplace_api::domain::subscription::{BillingTerms, Subscription, SubscriptionStatus};
/// use marketplace_api::domain::user::PlanType;
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// let now = Utc::now();
/// let (subscription, _) = Subscription::activate(
///     Uuid::new_v4(),
///     PlanType::B,
///     "pi_123".to_string(),
///     Decimal::new(9990, 2),
///     now,
///     BillingTerms::default(),
/// );
/// assert_eq!(subscription.status(), SubscriptionStatus::Active);
/// assert!(subscription.can_cancel_at(now));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    id: Uuid,
    user_id: Uuid,
    plan_type: PlanType,
    status: SubscriptionStatus,
    payment_intent_id: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    cancellation_deadline: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
    price: Decimal,
    auto_renew: bool,
}

impl Subscription {
    /// Starts an active subscription from a confirmed payment
    pub fn activate(
        user_id: Uuid,
        plan_type: PlanType,
        payment_intent_id: String,
        price: Decimal,
        now: DateTime<Utc>,
        terms: BillingTerms,
    ) -> (Self, SubscriptionEvent) {
        let subscription = Self {
            id: Uuid::new_v4(),
            user_id,
            plan_type,
            status: SubscriptionStatus::Active,
            payment_intent_id,
            start_date: now,
            end_date: now + terms.period,
            cancellation_deadline: now + terms.cancellation_grace,
            cancelled_at: None,
            price,
            auto_renew: true,
        };

        let event = SubscriptionEvent::Activated {
            subscription_id: subscription.id,
            user_id,
            plan_type,
        };

        (subscription, event)
    }

    /// True while `now` is inside the free-cancellation window (inclusive)
    pub fn can_cancel_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.cancellation_deadline
    }

    /// Requests cancellation at the end of the current period
    ///
    /// # Returns
    /// * `Ok(Some(event))` - cancellation recorded
    /// * `Ok(None)` - already pending or cancelled, nothing changed
    /// * `Err(AppError::PolicyViolation)` - the window closed; the
    ///   subscription keeps renewing
    pub fn request_cancellation(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriptionEvent>, AppError> {
        match self.status {
            SubscriptionStatus::CancellationPending | SubscriptionStatus::Cancelled => Ok(None),
            SubscriptionStatus::Active => {
                if !self.can_cancel_at(now) {
                    return Err(AppError::PolicyViolation(format!(
                        "The cancellation window closed on {}. The subscription will auto-renew; \
                         a later cancellation only takes effect at the end of the period ({})",
                        self.cancellation_deadline.to_rfc3339(),
                        self.end_date.to_rfc3339()
                    )));
                }

                self.transition_to(SubscriptionStatus::CancellationPending)?;
                self.cancelled_at = Some(now);
                self.auto_renew = false;

                Ok(Some(SubscriptionEvent::CancellationRequested {
                    subscription_id: self.id,
                    effective_at: self.end_date,
                }))
            }
        }
    }

    /// Applies period-end transitions that are due at `now`
    ///
    /// A pending cancellation becomes `Cancelled` once `end_date` is reached;
    /// an auto-renewing subscription rolls forward by whole periods.
    pub fn settle(&mut self, now: DateTime<Utc>, terms: BillingTerms) -> Vec<SubscriptionEvent> {
        let mut events = Vec::new();
        if now < self.end_date {
            return events;
        }

        match self.status {
            SubscriptionStatus::Active if self.auto_renew => {
                // a non-positive period would never catch up with `now`
                if terms.period <= Duration::zero() {
                    return events;
                }
                while now >= self.end_date {
                    self.start_date = self.end_date;
                    self.end_date = self.start_date + terms.period;
                    self.cancellation_deadline = self.start_date + terms.cancellation_grace;
                }
                events.push(SubscriptionEvent::Renewed {
                    subscription_id: self.id,
                    period_end: self.end_date,
                });
            }
            SubscriptionStatus::Active | SubscriptionStatus::CancellationPending => {
                if self.transition_to(SubscriptionStatus::Cancelled).is_ok() {
                    events.push(SubscriptionEvent::Cancelled {
                        subscription_id: self.id,
                        user_id: self.user_id,
                    });
                }
            }
            SubscriptionStatus::Cancelled => {}
        }

        events
    }

    fn transition_to(&mut self, next: SubscriptionStatus) -> Result<(), AppError> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::InvalidState(format!(
                "Cannot move subscription from {} to {}",
                self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }

    /// True while the subscription grants plan features
    ///
    /// A pending cancellation keeps access until the period ends.
    pub fn grants_access(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            SubscriptionStatus::Active => true,
            SubscriptionStatus::CancellationPending => now < self.end_date,
            SubscriptionStatus::Cancelled => false,
        }
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn plan_type(&self) -> PlanType {
        self.plan_type
    }

    pub fn status(&self) -> SubscriptionStatus {
        self.status
    }

    pub fn payment_intent_id(&self) -> &str {
        &self.payment_intent_id
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    pub fn end_date(&self) -> DateTime<Utc> {
        self.end_date
    }

    pub fn cancellation_deadline(&self) -> DateTime<Utc> {
        self.cancellation_deadline
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn auto_renew(&self) -> bool {
        self.auto_renew
    }

    /// Reconstructs a Subscription from persistence layer data
    ///
    /// Only to be used by repository implementations.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        user_id: Uuid,
        plan_type: PlanType,
        status: SubscriptionStatus,
        payment_intent_id: String,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        cancellation_deadline: DateTime<Utc>,
        cancelled_at: Option<DateTime<Utc>>,
        price: Decimal,
        auto_renew: bool,
    ) -> Self {
        Self {
            id,
            user_id,
            plan_type,
            status,
            payment_intent_id,
            start_date,
            end_date,
            cancellation_deadline,
            cancelled_at,
            price,
            auto_renew,
        }
    }
}
