use sqlx::PgPool;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::payments::PaymentProcessor;
use crate::domain::repositories::{
    ChatRepository, PropertyRepository, SessionStore, SubscriptionRepository, UserRepository,
};
use crate::infrastructure::repositories::{
    InMemoryChatRepository, InMemoryPropertyRepository, InMemorySubscriptionRepository,
    InMemoryUserRepository, PostgresChatRepository, PostgresPropertyRepository,
    PostgresSubscriptionRepository, PostgresUserRepository,
};
use crate::infrastructure::session::InMemorySessionStore;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepository>,
    pub properties: Arc<dyn PropertyRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub chat: Arc<dyn ChatRepository>,
    pub sessions: Arc<dyn SessionStore>,
    pub payments: Arc<dyn PaymentProcessor>,
}

impl AppState {
    /// State backed by process-local stores
    pub fn in_memory(config: AppConfig, payments: Arc<dyn PaymentProcessor>) -> Self {
        let sessions = Arc::new(InMemorySessionStore::new(config.session_ttl));
        Self {
            config: Arc::new(config),
            users: Arc::new(InMemoryUserRepository::new()),
            properties: Arc::new(InMemoryPropertyRepository::new()),
            subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
            chat: Arc::new(InMemoryChatRepository::new()),
            sessions,
            payments,
        }
    }

    /// State backed by PostgreSQL; sessions stay in process memory
    pub fn postgres(pool: PgPool, config: AppConfig, payments: Arc<dyn PaymentProcessor>) -> Self {
        let sessions = Arc::new(InMemorySessionStore::new(config.session_ttl));
        Self {
            config: Arc::new(config),
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            properties: Arc::new(PostgresPropertyRepository::new(pool.clone())),
            subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
            chat: Arc::new(PostgresChatRepository::new(pool)),
            sessions,
            payments,
        }
    }
}
