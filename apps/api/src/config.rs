//! Runtime configuration
//!
//! Read once at start-up from the environment (a `.env` file is loaded by
//! `main` first). Optional integrations fall back to in-process adapters:
//! no `DATABASE_URL` means in-memory repositories, no `STRIPE_SECRET_KEY`
//! means the mock payment processor.

use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use chrono::Duration;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::subscription::BillingTerms;
use crate::domain::user::PlanType;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {name} value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Fixed prices of the two plans, in minor units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanPricing {
    pub plan_a_cents: i64,
    pub plan_b_cents: i64,
}

impl PlanPricing {
    pub fn cents(&self, plan: PlanType) -> i64 {
        match plan {
            PlanType::A => self.plan_a_cents,
            PlanType::B => self.plan_b_cents,
        }
    }

    /// Price as a decimal amount in major units
    pub fn amount(&self, plan: PlanType) -> Decimal {
        Decimal::new(self.cents(plan), 2)
    }
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// `None` disables session expiry
    pub session_ttl: Option<Duration>,
    pub bcrypt_cost: u32,
    pub stripe: Option<StripeConfig>,
    pub payment_timeout: StdDuration,
    pub currency: String,
    pub pricing: PlanPricing,
    pub billing: BillingTerms,
}

const MAX_SESSION_TTL_HOURS: i64 = 24 * 365 * 10;
const MAX_BILLING_PERIOD_DAYS: i64 = 3660;

/// Environment variables read through a lookup function
struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.trim().is_empty())
    }

    fn parse<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.var(name) {
            Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                value: value.clone(),
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }

    fn parse_in<T>(
        &self,
        name: &'static str,
        default: T,
        range: RangeInclusive<T>,
    ) -> Result<T, ConfigError>
    where
        T: FromStr + PartialOrd + std::fmt::Display,
        T::Err: std::fmt::Display,
    {
        let value = self.parse(name, default)?;
        if !range.contains(&value) {
            return Err(ConfigError::Invalid {
                name,
                value: value.to_string(),
                reason: format!(
                    "expected a value between {} and {}",
                    range.start(),
                    range.end()
                ),
            });
        }
        Ok(value)
    }
}

impl AppConfig {
    /// Create the configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let ttl_hours: i64 = env.parse_in("SESSION_TTL_HOURS", 168, 0..=MAX_SESSION_TTL_HOURS)?;
        let bcrypt_cost: u32 = env.parse_in("BCRYPT_COST", bcrypt::DEFAULT_COST, 4..=31)?;
        let period_days: i64 =
            env.parse_in("BILLING_PERIOD_DAYS", 30, 1..=MAX_BILLING_PERIOD_DAYS)?;
        let grace_days: i64 = env.parse_in("CANCELLATION_GRACE_DAYS", 7, 0..=period_days)?;

        Ok(Self {
            bind_addr: env.parse("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            database_url: env.var("DATABASE_URL"),
            database_max_connections: env.parse_in("DATABASE_MAX_CONNECTIONS", 5, 1..=1000)?,
            session_ttl: (ttl_hours > 0).then(|| Duration::hours(ttl_hours)),
            bcrypt_cost,
            stripe: env.var("STRIPE_SECRET_KEY").map(|secret_key| StripeConfig {
                secret_key,
                api_base: env
                    .var("STRIPE_API_BASE")
                    .unwrap_or_else(|| "https://api.stripe.com".to_string()),
            }),
            payment_timeout: StdDuration::from_secs(env.parse_in("PAYMENT_TIMEOUT_SECS", 15, 1..=300)?),
            currency: env.var("PAYMENT_CURRENCY").unwrap_or_else(|| "brl".to_string()),
            pricing: PlanPricing {
                plan_a_cents: env.parse_in("PLAN_A_PRICE_CENTS", 4990, 1..=i64::from(u32::MAX))?,
                plan_b_cents: env.parse_in("PLAN_B_PRICE_CENTS", 9990, 1..=i64::from(u32::MAX))?,
            },
            billing: BillingTerms::new(period_days, grace_days),
        })
    }

    /// Create a test configuration (in-memory stores, mock payments)
    pub fn test() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            database_url: None,
            database_max_connections: 1,
            session_ttl: Some(Duration::hours(1)),
            bcrypt_cost: 4,
            stripe: None,
            payment_timeout: StdDuration::from_secs(5),
            currency: "brl".to_string(),
            pricing: PlanPricing {
                plan_a_cents: 4990,
                plan_b_cents: 9990,
            },
            billing: BillingTerms::default(),
        }
    }
}
