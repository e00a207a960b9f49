use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::StoreError;
use crate::domain::property::{Property, PropertyFilter};

/// Repository trait for listings
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    /// Insert a new listing
    async fn create(&self, property: &Property) -> Result<(), StoreError>;

    /// Find a listing by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>, StoreError>;

    /// List listings matching a filter, featured first then newest
    async fn list(&self, filter: &PropertyFilter) -> Result<Vec<Property>, StoreError>;

    /// List listings owned by an agency (provider)
    async fn list_by_agency(&self, agency_id: Uuid) -> Result<Vec<Property>, StoreError>;

    /// Count listings owned by an agency
    async fn count_by_agency(&self, agency_id: Uuid) -> Result<u64, StoreError>;

    /// Atomically add one view, returning the new count
    async fn increment_views(&self, id: Uuid) -> Result<i64, StoreError>;
}
