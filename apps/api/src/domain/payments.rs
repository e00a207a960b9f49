//! Payment processor port
//!
//! Plan purchases go through an external processor. The application only
//! creates payment intents and reads them back; card handling stays on the
//! processor side.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use super::errors::AppError;

/// Payment processor errors
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment provider error: {0}")]
    Provider(String),

    #[error("Payment provider timed out")]
    Timeout,

    #[error("Payment intent not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        AppError::ExternalService(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    Succeeded,
    Canceled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub status: PaymentIntentStatus,
    /// Amount in the currency's minor unit
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// True for ids shaped like processor intent ids (`pi_3MtwBw2eZvKYlo2C`)
///
/// Ids arrive from unauthenticated callers and end up in request paths.
pub fn is_valid_intent_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 255
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Port to the external payment processor
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a payment intent for `amount` minor units
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        metadata: HashMap<String, String>,
    ) -> Result<PaymentIntent, PaymentError>;

    /// Fetch the current state of a payment intent
    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError>;
}
