use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::str::FromStr;
use uuid::Uuid;

use super::value_objects::{is_web_url, PriceType, PropertyStatus, PropertyType};
use crate::domain::errors::{AppError, FieldError};

/// A real-estate listing owned by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub price_type: PriceType,
    pub property_type: PropertyType,
    pub location: String,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub parking_spaces: Option<i32>,
    pub area: Option<i32>,
    pub image_url: String,
    pub images: Vec<String>,
    pub amenities: BTreeSet<String>,
    pub agency_name: String,
    pub agency_id: Uuid,
    pub status: PropertyStatus,
    pub featured: bool,
    pub views: i64,
    pub created_at: DateTime<Utc>,
}

/// Unvalidated listing data as submitted by a provider
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Option<Decimal>,
    pub price_type: Option<PriceType>,
    pub property_type: Option<PropertyType>,
    #[serde(default)]
    pub location: String,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub parking_spaces: Option<i32>,
    pub area: Option<i32>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub amenities: BTreeSet<String>,
    #[serde(default)]
    pub featured: bool,
}

/// Listing data exactly as it arrived in a request body
///
/// Every field is kept as raw JSON so that a wrongly typed value becomes a
/// field error next to the others instead of failing the whole body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyForm {
    pub title: Option<Value>,
    pub description: Option<Value>,
    pub price: Option<Value>,
    pub price_type: Option<Value>,
    pub property_type: Option<Value>,
    pub location: Option<Value>,
    pub bedrooms: Option<Value>,
    pub bathrooms: Option<Value>,
    pub parking_spaces: Option<Value>,
    pub area: Option<Value>,
    pub image_url: Option<Value>,
    #[serde(default)]
    pub images: Vec<Value>,
    #[serde(default)]
    pub amenities: Vec<Value>,
    pub featured: Option<Value>,
}

fn text(value: Option<Value>, field: &str, errors: &mut Vec<FieldError>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(_) => {
            errors.push(FieldError::new(field, "Must be a string"));
            String::new()
        }
    }
}

fn whole_number(value: Option<Value>, field: &str, errors: &mut Vec<FieldError>) -> Option<i32> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => match n.as_i64().and_then(|n| i32::try_from(n).ok()) {
            Some(n) => Some(n),
            None => {
                errors.push(FieldError::new(field, "Must be a whole number"));
                None
            }
        },
        Some(_) => {
            errors.push(FieldError::new(field, "Must be a whole number"));
            None
        }
    }
}

fn decimal(value: Option<Value>, field: &str, errors: &mut Vec<FieldError>) -> Option<Decimal> {
    let parsed = match value {
        None | Some(Value::Null) => return None,
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string()).ok(),
        Some(Value::String(s)) => Decimal::from_str(s.trim()).ok(),
        Some(_) => None,
    };
    if parsed.is_none() {
        errors.push(FieldError::new(field, "Must be a number"));
    }
    parsed
}

fn choice<T: FromStr>(value: Option<Value>, field: &str, errors: &mut Vec<FieldError>) -> Option<T> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => match s.trim().parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                errors.push(FieldError::new(field, format!("Unknown value: {}", s)));
                None
            }
        },
        Some(_) => {
            errors.push(FieldError::new(field, "Must be a string"));
            None
        }
    }
}

impl PropertyForm {
    /// Converts the raw body into a draft
    ///
    /// Type errors and constraint violations are reported together, one
    /// entry per field.
    pub fn into_draft(self) -> Result<PropertyDraft, AppError> {
        let mut errors = Vec::new();

        let images = self
            .images
            .into_iter()
            .enumerate()
            .map(|(index, image)| text(Some(image), &format!("images[{}]", index), &mut errors))
            .collect();
        let amenities = self
            .amenities
            .into_iter()
            .filter_map(|amenity| match amenity {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect();
        let featured = match self.featured {
            None | Some(Value::Null) => false,
            Some(Value::Bool(featured)) => featured,
            Some(_) => {
                errors.push(FieldError::new("featured", "Must be true or false"));
                false
            }
        };

        let draft = PropertyDraft {
            title: text(self.title, "title", &mut errors),
            description: text(self.description, "description", &mut errors),
            price: decimal(self.price, "price", &mut errors),
            price_type: choice(self.price_type, "priceType", &mut errors),
            property_type: choice(self.property_type, "propertyType", &mut errors),
            location: text(self.location, "location", &mut errors),
            bedrooms: whole_number(self.bedrooms, "bedrooms", &mut errors),
            bathrooms: whole_number(self.bathrooms, "bathrooms", &mut errors),
            parking_spaces: whole_number(self.parking_spaces, "parkingSpaces", &mut errors),
            area: whole_number(self.area, "area", &mut errors),
            image_url: text(self.image_url, "imageUrl", &mut errors),
            images,
            amenities,
            featured,
        };

        // a field that failed to parse is not reported a second time as missing
        for violation in draft.field_errors() {
            if !errors.iter().any(|e| e.field == violation.field) {
                errors.push(violation);
            }
        }

        if errors.is_empty() {
            Ok(draft)
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

impl PropertyDraft {
    /// Checks every field constraint and reports all violations at once
    pub fn validate(&self) -> Result<(), AppError> {
        let errors = self.field_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }

    fn field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.title.trim().chars().count() < 5 {
            errors.push(FieldError::new("title", "Title must be at least 5 characters"));
        }
        if self.description.trim().chars().count() < 20 {
            errors.push(FieldError::new(
                "description",
                "Description must be at least 20 characters",
            ));
        }
        match self.price {
            None => errors.push(FieldError::new("price", "Price is required")),
            Some(price) if price <= Decimal::ZERO => {
                errors.push(FieldError::new("price", "Price must be positive"))
            }
            Some(_) => {}
        }
        if self.price_type.is_none() {
            errors.push(FieldError::new("priceType", "Price type is required"));
        }
        if self.property_type.is_none() {
            errors.push(FieldError::new("propertyType", "Property type is required"));
        }
        if self.location.trim().is_empty() {
            errors.push(FieldError::new("location", "Location is required"));
        }
        if matches!(self.bedrooms, Some(n) if n < 0) {
            errors.push(FieldError::new("bedrooms", "Bedrooms cannot be negative"));
        }
        if matches!(self.bathrooms, Some(n) if n < 1) {
            errors.push(FieldError::new("bathrooms", "Bathrooms must be at least 1"));
        }
        if matches!(self.parking_spaces, Some(n) if n < 0) {
            errors.push(FieldError::new(
                "parkingSpaces",
                "Parking spaces cannot be negative",
            ));
        }
        if matches!(self.area, Some(n) if n < 1) {
            errors.push(FieldError::new("area", "Area must be at least 1"));
        }
        if !is_web_url(&self.image_url) {
            errors.push(FieldError::new("imageUrl", "Image URL must be a valid URL"));
        }
        for (index, image) in self.images.iter().enumerate() {
            if !is_web_url(image) {
                errors.push(FieldError::new(
                    format!("images[{}]", index),
                    "Image URL must be a valid URL",
                ));
            }
        }

        errors
    }
}

impl Property {
    /// Creates a listing from a draft, owned by the given agency
    ///
    /// New listings start `available` with zero views.
    pub fn create(draft: PropertyDraft, agency_id: Uuid, agency_name: String) -> Result<Self, AppError> {
        draft.validate()?;

        let (price, price_type, property_type) = match (draft.price, draft.price_type, draft.property_type) {
            (Some(price), Some(price_type), Some(property_type)) => (price, price_type, property_type),
            _ => return Err(AppError::Internal("validated draft is missing fields".to_string())),
        };

        Ok(Self {
            id: Uuid::new_v4(),
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            price,
            price_type,
            property_type,
            location: draft.location.trim().to_string(),
            bedrooms: draft.bedrooms,
            bathrooms: draft.bathrooms,
            parking_spaces: draft.parking_spaces,
            area: draft.area,
            image_url: draft.image_url,
            images: draft.images,
            amenities: draft.amenities,
            agency_name,
            agency_id,
            status: PropertyStatus::Available,
            featured: draft.featured,
            views: 0,
            created_at: Utc::now(),
        })
    }
}

/// Optional filters for listing searches
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFilter {
    pub price_type: Option<PriceType>,
    pub property_type: Option<PropertyType>,
    pub city: Option<String>,
    pub featured: Option<bool>,
}

impl PropertyFilter {
    pub fn matches(&self, property: &Property) -> bool {
        self.price_type.map_or(true, |t| property.price_type == t)
            && self.property_type.map_or(true, |t| property.property_type == t)
            && self.featured.map_or(true, |f| property.featured == f)
            && self.city.as_ref().map_or(true, |city| {
                property
                    .location
                    .to_lowercase()
                    .contains(&city.trim().to_lowercase())
            })
    }
}
