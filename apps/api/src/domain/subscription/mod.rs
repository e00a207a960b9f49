// Subscription domain module
// Contains the subscription aggregate, its value objects and domain events

#![allow(clippy::module_inception)]

pub mod events;
pub mod subscription;
pub mod value_objects;

pub use events::SubscriptionEvent;
pub use subscription::Subscription;
pub use value_objects::{BillingTerms, SubscriptionStatus};
