use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::StoreError;
use crate::domain::subscription::Subscription;

/// Repository trait for Subscription aggregate
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert a subscription, `StoreError::Conflict` when the payment intent
    /// already produced one
    async fn create(&self, subscription: &Subscription) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subscription>, StoreError>;

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<Subscription>, StoreError>;

    /// Subscriptions of a user, newest first
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Subscription>, StoreError>;

    /// Persist status and date changes
    async fn update(&self, subscription: &Subscription) -> Result<(), StoreError>;
}
