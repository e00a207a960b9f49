pub mod auth;

pub use auth::{AuthContext, RequireAuth, RequireProvider, RequireRealEstateProvider};
