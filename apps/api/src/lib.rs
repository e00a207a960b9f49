//! Marketplace API Library
//!
//! Accounts, provider onboarding, real-estate listings, plan subscriptions
//! and chat for a two-sided services marketplace. `main` wires the pieces
//! together; integration tests drive [`api::build_router`] directly.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod services;
pub mod state;
