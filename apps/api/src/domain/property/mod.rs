// Property domain module
// Listings published by real-estate providers

#![allow(clippy::module_inception)]

pub mod property;
pub mod value_objects;

pub use property::{Property, PropertyDraft, PropertyFilter, PropertyForm};
pub use value_objects::{PriceType, PropertyStatus, PropertyType};
