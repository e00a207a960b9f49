use std::sync::Arc;
use uuid::Uuid;

use crate::domain::access::{require_provider, require_real_estate_provider};
use crate::domain::errors::{AppError, AppResult, StoreError};
use crate::domain::property::{Property, PropertyDraft, PropertyFilter};
use crate::domain::repositories::PropertyRepository;
use crate::domain::user::User;
use crate::state::AppState;

/// Listing publication and search
pub struct PropertyService {
    properties: Arc<dyn PropertyRepository>,
}

impl PropertyService {
    pub fn new(state: &AppState) -> Self {
        Self {
            properties: Arc::clone(&state.properties),
        }
    }

    /// Publishes a listing owned by the calling provider
    ///
    /// The real-estate gate is checked again here, so the operation stays
    /// safe when reached without the request extractor.
    pub async fn create(&self, user: &User, draft: PropertyDraft) -> AppResult<Property> {
        require_real_estate_provider(user)?;

        let property = Property::create(draft, user.id, user.name.clone())?;
        self.properties.create(&property).await?;

        tracing::info!(property_id = %property.id, agency_id = %user.id, "property created");
        Ok(property)
    }

    pub async fn list(&self, filter: &PropertyFilter) -> AppResult<Vec<Property>> {
        Ok(self.properties.list(filter).await?)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Property> {
        self.properties
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Property not found: {}", id)))
    }

    /// Counts one view, returning the new total
    pub async fn record_view(&self, id: Uuid) -> AppResult<i64> {
        self.properties.increment_views(id).await.map_err(|e| match e {
            StoreError::NotFound => AppError::NotFound(format!("Property not found: {}", id)),
            other => other.into(),
        })
    }

    /// Listings of the calling provider
    pub async fn list_owned(&self, user: &User) -> AppResult<Vec<Property>> {
        require_provider(user)?;
        Ok(self.properties.list_by_agency(user.id).await?)
    }
}
