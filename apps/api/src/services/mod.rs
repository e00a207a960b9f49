//! Application services
//!
//! Each service orchestrates domain rules over the repositories held in
//! [`AppState`](crate::state::AppState) and is cheap to build per request.

pub mod account_service;
pub mod chat_service;
pub mod profile_service;
pub mod property_service;
pub mod subscription_service;

pub use account_service::{AccountService, ProviderInput, RegisterInput, RegisterProviderInput};
pub use chat_service::ChatService;
pub use profile_service::{ProfileService, ProfileUpdate};
pub use property_service::PropertyService;
pub use subscription_service::{PaymentStarted, SubscriptionService};
