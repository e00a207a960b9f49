use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::errors::StoreError;
use crate::domain::repositories::SubscriptionRepository;
use crate::domain::subscription::Subscription;

/// PostgreSQL implementation of SubscriptionRepository
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    /// Creates a new PostgresSubscriptionRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_SUBSCRIPTION: &str = r#"
    SELECT id, user_id, plan_type, status, payment_intent_id, start_date, end_date,
           cancellation_deadline, cancelled_at, price, auto_renew
    FROM subscriptions
"#;

#[derive(FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    plan_type: String,
    status: String,
    payment_intent_id: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    cancellation_deadline: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
    price: Decimal,
    auto_renew: bool,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = StoreError;

    fn try_from(r: SubscriptionRow) -> Result<Self, Self::Error> {
        let invalid = |e: String| StoreError::Database(format!("Invalid subscription row: {}", e));
        Ok(Subscription::from_persistence(
            r.id,
            r.user_id,
            r.plan_type.parse().map_err(invalid)?,
            r.status.parse().map_err(invalid)?,
            r.payment_intent_id,
            r.start_date,
            r.end_date,
            r.cancellation_deadline,
            r.cancelled_at,
            r.price,
            r.auto_renew,
        ))
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn create(&self, subscription: &Subscription) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, plan_type, status, payment_intent_id, start_date, end_date,
                cancellation_deadline, cancelled_at, price, auto_renew
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(subscription.id())
        .bind(subscription.user_id())
        .bind(subscription.plan_type().to_string())
        .bind(subscription.status().to_string())
        .bind(subscription.payment_intent_id())
        .bind(subscription.start_date())
        .bind(subscription.end_date())
        .bind(subscription.cancellation_deadline())
        .bind(subscription.cancelled_at())
        .bind(subscription.price())
        .bind(subscription.auto_renew())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subscription>, StoreError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "{} WHERE id = $1",
            SELECT_SUBSCRIPTION
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<Subscription>, StoreError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "{} WHERE payment_intent_id = $1",
            SELECT_SUBSCRIPTION
        ))
        .bind(payment_intent_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Subscription::try_from).transpose()
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Subscription>, StoreError> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "{} WHERE user_id = $1 ORDER BY start_date DESC",
            SELECT_SUBSCRIPTION
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = $2, start_date = $3, end_date = $4, cancellation_deadline = $5,
                cancelled_at = $6, auto_renew = $7
            WHERE id = $1
            "#,
        )
        .bind(subscription.id())
        .bind(subscription.status().to_string())
        .bind(subscription.start_date())
        .bind(subscription.end_date())
        .bind(subscription.cancellation_deadline())
        .bind(subscription.cancelled_at())
        .bind(subscription.auto_renew())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
