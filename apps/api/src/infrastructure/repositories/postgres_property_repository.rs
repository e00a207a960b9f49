use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::errors::StoreError;
use crate::domain::property::{Property, PropertyFilter};
use crate::domain::repositories::PropertyRepository;

/// PostgreSQL implementation of PropertyRepository
pub struct PostgresPropertyRepository {
    pool: PgPool,
}

impl PostgresPropertyRepository {
    /// Creates a new PostgresPropertyRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_PROPERTY: &str = r#"
    SELECT id, title, description, price, price_type, property_type, location,
           bedrooms, bathrooms, parking_spaces, area, image_url, images, amenities,
           agency_name, agency_id, status, featured, views, created_at
    FROM properties
"#;

#[derive(FromRow)]
struct PropertyRow {
    id: Uuid,
    title: String,
    description: String,
    price: Decimal,
    price_type: String,
    property_type: String,
    location: String,
    bedrooms: Option<i32>,
    bathrooms: Option<i32>,
    parking_spaces: Option<i32>,
    area: Option<i32>,
    image_url: String,
    images: Vec<String>,
    amenities: Vec<String>,
    agency_name: String,
    agency_id: Uuid,
    status: String,
    featured: bool,
    views: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<PropertyRow> for Property {
    type Error = StoreError;

    fn try_from(r: PropertyRow) -> Result<Self, Self::Error> {
        let invalid = |e: String| StoreError::Database(format!("Invalid property row: {}", e));
        Ok(Property {
            id: r.id,
            title: r.title,
            description: r.description,
            price: r.price,
            price_type: r.price_type.parse().map_err(invalid)?,
            property_type: r.property_type.parse().map_err(invalid)?,
            location: r.location,
            bedrooms: r.bedrooms,
            bathrooms: r.bathrooms,
            parking_spaces: r.parking_spaces,
            area: r.area,
            image_url: r.image_url,
            images: r.images,
            amenities: r.amenities.into_iter().collect(),
            agency_name: r.agency_name,
            agency_id: r.agency_id,
            status: r.status.parse().map_err(invalid)?,
            featured: r.featured,
            views: r.views,
            created_at: r.created_at,
        })
    }
}

fn into_properties(rows: Vec<PropertyRow>) -> Result<Vec<Property>, StoreError> {
    rows.into_iter().map(Property::try_from).collect()
}

#[async_trait]
impl PropertyRepository for PostgresPropertyRepository {
    async fn create(&self, property: &Property) -> Result<(), StoreError> {
        let amenities: Vec<String> = property.amenities.iter().cloned().collect();

        sqlx::query(
            r#"
            INSERT INTO properties (
                id, title, description, price, price_type, property_type, location,
                bedrooms, bathrooms, parking_spaces, area, image_url, images, amenities,
                agency_name, agency_id, status, featured, views, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(property.id)
        .bind(&property.title)
        .bind(&property.description)
        .bind(property.price)
        .bind(property.price_type.to_string())
        .bind(property.property_type.to_string())
        .bind(&property.location)
        .bind(property.bedrooms)
        .bind(property.bathrooms)
        .bind(property.parking_spaces)
        .bind(property.area)
        .bind(&property.image_url)
        .bind(&property.images)
        .bind(&amenities)
        .bind(&property.agency_name)
        .bind(property.agency_id)
        .bind(property.status.to_string())
        .bind(property.featured)
        .bind(property.views)
        .bind(property.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>, StoreError> {
        let row = sqlx::query_as::<_, PropertyRow>(&format!("{} WHERE id = $1", SELECT_PROPERTY))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Property::try_from).transpose()
    }

    async fn list(&self, filter: &PropertyFilter) -> Result<Vec<Property>, StoreError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_PROPERTY);
        query.push(" WHERE TRUE");
        if let Some(price_type) = filter.price_type {
            query.push(" AND price_type = ").push_bind(price_type.to_string());
        }
        if let Some(property_type) = filter.property_type {
            query.push(" AND property_type = ").push_bind(property_type.to_string());
        }
        if let Some(featured) = filter.featured {
            query.push(" AND featured = ").push_bind(featured);
        }
        if let Some(city) = &filter.city {
            query
                .push(" AND location ILIKE ")
                .push_bind(format!("%{}%", city.trim()));
        }
        query.push(" ORDER BY featured DESC, created_at DESC");

        let rows = query
            .build_query_as::<PropertyRow>()
            .fetch_all(&self.pool)
            .await?;

        into_properties(rows)
    }

    async fn list_by_agency(&self, agency_id: Uuid) -> Result<Vec<Property>, StoreError> {
        let rows = sqlx::query_as::<_, PropertyRow>(&format!(
            "{} WHERE agency_id = $1 ORDER BY created_at DESC",
            SELECT_PROPERTY
        ))
        .bind(agency_id)
        .fetch_all(&self.pool)
        .await?;

        into_properties(rows)
    }

    async fn count_by_agency(&self, agency_id: Uuid) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM properties WHERE agency_id = $1")
            .bind(agency_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn increment_views(&self, id: Uuid) -> Result<i64, StoreError> {
        let views: Option<i64> =
            sqlx::query_scalar("UPDATE properties SET views = views + 1 WHERE id = $1 RETURNING views")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        views.ok_or(StoreError::NotFound)
    }
}
