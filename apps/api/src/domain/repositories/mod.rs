// Repository interfaces (ports)
// Implemented by adapters in the infrastructure layer

pub mod chat_repository;
pub mod property_repository;
pub mod session_store;
pub mod subscription_repository;
pub mod user_repository;

pub use chat_repository::ChatRepository;
pub use property_repository::PropertyRepository;
pub use session_store::SessionStore;
pub use subscription_repository::SubscriptionRepository;
pub use user_repository::{UserEdit, UserRepository};
