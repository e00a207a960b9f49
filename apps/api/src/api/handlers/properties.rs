use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::{RequireProvider, RequireRealEstateProvider};
use crate::domain::property::{Property, PropertyFilter, PropertyForm};
use crate::services::PropertyService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PropertyResponse {
    pub success: bool,
    pub property: Property,
}

#[derive(Debug, Serialize)]
pub struct PropertyListResponse {
    pub success: bool,
    pub properties: Vec<Property>,
}

impl From<Vec<Property>> for PropertyListResponse {
    fn from(properties: Vec<Property>) -> Self {
        Self {
            success: true,
            properties,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ViewsResponse {
    pub success: bool,
    pub views: i64,
}

/// Publish a listing
///
/// POST /properties
pub async fn create_property(
    State(state): State<AppState>,
    RequireRealEstateProvider(ctx): RequireRealEstateProvider,
    payload: Result<Json<PropertyForm>, JsonRejection>,
) -> Result<(StatusCode, Json<PropertyResponse>), ApiError> {
    let Json(form) = payload?;
    let draft = form.into_draft()?;
    let property = PropertyService::new(&state).create(&ctx.user, draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(PropertyResponse {
            success: true,
            property,
        }),
    ))
}

/// Search listings
///
/// GET /properties?priceType=&propertyType=&city=&featured=
pub async fn list_properties(
    State(state): State<AppState>,
    filter: Result<Query<PropertyFilter>, QueryRejection>,
) -> Result<Json<PropertyListResponse>, ApiError> {
    let Query(filter) = filter?;
    let properties = PropertyService::new(&state).list(&filter).await?;
    Ok(Json(properties.into()))
}

/// GET /properties/:id
pub async fn get_property(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<PropertyResponse>, ApiError> {
    let Path(id) = id?;
    let property = PropertyService::new(&state).get(id).await?;
    Ok(Json(PropertyResponse {
        success: true,
        property,
    }))
}

/// POST /properties/:id/view
pub async fn record_view(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ViewsResponse>, ApiError> {
    let Path(id) = id?;
    let views = PropertyService::new(&state).record_view(id).await?;
    Ok(Json(ViewsResponse {
        success: true,
        views,
    }))
}

/// Listings of the calling provider
///
/// GET /provider/properties
pub async fn list_own_properties(
    State(state): State<AppState>,
    RequireProvider(ctx): RequireProvider,
) -> Result<Json<PropertyListResponse>, ApiError> {
    let properties = PropertyService::new(&state).list_owned(&ctx.user).await?;
    Ok(Json(properties.into()))
}
