// User domain module
// Accounts, provider profiles and their value objects

#![allow(clippy::module_inception)]

pub mod user;
pub mod value_objects;

pub use user::{
    Account, ProviderData, ProviderProfile, ProviderView, User, UserView, MAX_PORTFOLIO_IMAGES,
    MAX_SUBCATEGORIES, REAL_ESTATE_CATEGORY,
};
pub use value_objects::{DocumentType, Email, Location, PlanStatus, PlanType, UserType};
