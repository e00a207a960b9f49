// Infrastructure layer module
// Contains database adapters and external service integrations
// Follows Hexagonal Architecture

pub mod payments;
pub mod repositories;
pub mod session;
