use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a paid subscription
///
/// # Status Transitions
/// ```text
/// Active -> CancellationPending -> Cancelled
///   └---> Active (renewed)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Paid and renewing
    Active,
    /// Cancellation requested, usable until the period ends
    CancellationPending,
    /// Period ended after a cancellation
    Cancelled,
}

impl SubscriptionStatus {
    pub fn can_transition_to(&self, next: SubscriptionStatus) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, next),
            (Active, CancellationPending)
                | (Active, Active)
                | (Active, Cancelled)
                | (CancellationPending, Cancelled)
        )
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionStatus::Active => write!(f, "active"),
            SubscriptionStatus::CancellationPending => write!(f, "cancellation_pending"),
            SubscriptionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "cancellation_pending" => Ok(SubscriptionStatus::CancellationPending),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            _ => Err(format!("Unknown subscription status: {}", s)),
        }
    }
}

/// Billing period and free-cancellation window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingTerms {
    pub period: Duration,
    pub cancellation_grace: Duration,
}

impl BillingTerms {
    pub fn new(period_days: i64, grace_days: i64) -> Self {
        Self {
            period: Duration::days(period_days),
            cancellation_grace: Duration::days(grace_days),
        }
    }
}

impl Default for BillingTerms {
    fn default() -> Self {
        Self::new(30, 7)
    }
}
