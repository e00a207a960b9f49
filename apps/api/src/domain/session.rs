// Session domain model
// An opaque bearer token bound to a snapshot of the authenticated user

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::user::User;

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    /// Denormalized copy of the user, refreshed after profile mutations
    pub user: User,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}
