//! In-process payment processor for development and tests

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::payments::{PaymentError, PaymentIntent, PaymentIntentStatus, PaymentProcessor};

/// Mock processor keeping intents in memory
///
/// Intents start as `requires_payment_method`; tests confirm them with
/// [`MockPaymentProcessor::mark_succeeded`].
#[derive(Default)]
pub struct MockPaymentProcessor {
    intents: DashMap<String, PaymentIntent>,
    fail_requests: AtomicBool,
}

impl MockPaymentProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the customer completing payment
    pub fn mark_succeeded(&self, id: &str) -> Result<(), PaymentError> {
        let mut intent = self
            .intents
            .get_mut(id)
            .ok_or_else(|| PaymentError::NotFound(id.to_string()))?;
        intent.status = PaymentIntentStatus::Succeeded;
        Ok(())
    }

    /// Makes every following call fail like an unreachable provider
    pub fn set_unavailable(&self, unavailable: bool) {
        self.fail_requests.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), PaymentError> {
        if self.fail_requests.load(Ordering::SeqCst) {
            return Err(PaymentError::Timeout);
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentProcessor for MockPaymentProcessor {
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        metadata: HashMap<String, String>,
    ) -> Result<PaymentIntent, PaymentError> {
        self.check_available()?;

        let id = format!("pi_mock_{}", uuid::Uuid::new_v4().simple());
        let intent = PaymentIntent {
            client_secret: format!("{}_secret_{}", id, uuid::Uuid::new_v4().simple()),
            id: id.clone(),
            status: PaymentIntentStatus::RequiresPaymentMethod,
            amount,
            currency: currency.to_string(),
            metadata,
        };
        self.intents.insert(id, intent.clone());

        tracing::info!(payment_intent_id = %intent.id, amount, "Mock payment intent created");
        Ok(intent)
    }

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
        self.check_available()?;
        self.intents
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| PaymentError::NotFound(id.to_string()))
    }
}
