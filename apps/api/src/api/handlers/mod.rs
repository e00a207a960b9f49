pub mod auth;
pub mod chat;
pub mod profile;
pub mod properties;
pub mod subscriptions;
