// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod access;
pub mod category;
pub mod chat;
pub mod errors;
pub mod onboarding;
pub mod payments;
pub mod property;
pub mod repositories;
pub mod session;
pub mod subscription;
pub mod user;
