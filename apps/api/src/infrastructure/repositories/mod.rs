// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod in_memory;
pub mod postgres_chat_repository;
pub mod postgres_property_repository;
pub mod postgres_subscription_repository;
pub mod postgres_user_repository;

pub use in_memory::{
    InMemoryChatRepository, InMemoryPropertyRepository, InMemorySubscriptionRepository,
    InMemoryUserRepository,
};
pub use postgres_chat_repository::PostgresChatRepository;
pub use postgres_property_repository::PostgresPropertyRepository;
pub use postgres_subscription_repository::PostgresSubscriptionRepository;
pub use postgres_user_repository::PostgresUserRepository;
