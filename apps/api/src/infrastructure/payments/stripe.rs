//! Stripe payment intents over the REST API

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;

use crate::config::StripeConfig;
use crate::domain::payments::{is_valid_intent_id, PaymentError, PaymentIntent, PaymentProcessor};

/// HTTP client for Stripe's payment intent endpoints
#[derive(Debug, Clone)]
pub struct StripePaymentProcessor {
    config: StripeConfig,
    http: Client,
}

impl StripePaymentProcessor {
    /// Builds a client whose every request is bounded by `timeout`
    pub fn new(config: StripeConfig, timeout: Duration) -> Result<Self, PaymentError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PaymentError::Config(e.to_string()))?;
        Ok(Self { config, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    async fn parse(response: reqwest::Response, id: Option<&str>) -> Result<PaymentIntent, PaymentError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PaymentError::NotFound(id.unwrap_or_default().to_string()));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PaymentError::Provider(format!(
                "request failed with status {}: {}",
                status, text
            )));
        }
        response.json().await.map_err(transport)
    }
}

fn transport(err: reqwest::Error) -> PaymentError {
    if err.is_timeout() {
        PaymentError::Timeout
    } else {
        PaymentError::Provider(err.to_string())
    }
}

#[async_trait]
impl PaymentProcessor for StripePaymentProcessor {
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        metadata: HashMap<String, String>,
    ) -> Result<PaymentIntent, PaymentError> {
        let mut form: Vec<(String, String)> = vec![
            ("amount".to_string(), amount.to_string()),
            ("currency".to_string(), currency.to_string()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];
        form.extend(
            metadata
                .into_iter()
                .map(|(key, value)| (format!("metadata[{}]", key), value)),
        );

        let response = self
            .http
            .post(self.url("payment_intents"))
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(transport)?;

        Self::parse(response, None).await
    }

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
        // the id becomes a path segment
        if !is_valid_intent_id(id) {
            return Err(PaymentError::NotFound(id.to_string()));
        }

        let response = self
            .http
            .get(self.url(&format!("payment_intents/{}", id)))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(transport)?;

        Self::parse(response, Some(id)).await
    }
}
