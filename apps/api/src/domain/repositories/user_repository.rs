use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::{AppError, StoreError};
use crate::domain::user::{Email, User};

/// In-place change applied by [`UserRepository::modify`]
///
/// Returning an error leaves the stored user untouched.
pub type UserEdit = Box<dyn FnOnce(&mut User) -> Result<(), AppError> + Send>;

/// Repository trait for User aggregate
///
/// The provider profile travels with the user; `update` replaces both.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user, `StoreError::Conflict` when the email is taken
    async fn create(&self, user: &User) -> Result<Uuid, StoreError>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Find a user by email address
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, StoreError>;

    /// Replace a stored user, `StoreError::NotFound` when absent
    async fn update(&self, user: &User) -> Result<(), StoreError>;

    /// Read, edit and write back one user while holding it exclusively
    ///
    /// Concurrent `modify` calls on the same user are serialized, so an edit
    /// always sees the latest stored state. Returns the stored result.
    async fn modify(&self, id: Uuid, edit: UserEdit) -> Result<User, AppError>;
}
