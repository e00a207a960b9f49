use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::user::PlanType;

/// Domain events raised by the Subscription aggregate
///
/// Services react to them to keep the owner's plan status in sync.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionEvent {
    /// A confirmed payment started a subscription
    Activated {
        subscription_id: Uuid,
        user_id: Uuid,
        plan_type: PlanType,
    },
    /// The owner asked to cancel within the free-cancellation window
    CancellationRequested {
        subscription_id: Uuid,
        effective_at: DateTime<Utc>,
    },
    /// A pending cancellation reached the end of its period
    Cancelled { subscription_id: Uuid, user_id: Uuid },
    /// An auto-renewing subscription rolled into a new period
    Renewed {
        subscription_id: Uuid,
        period_end: DateTime<Utc>,
    },
}
