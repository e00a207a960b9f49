use async_trait::async_trait;

use crate::domain::session::Session;
use crate::domain::user::User;

/// Opaque-token to identity lookup
///
/// Every operation mutates process-wide state; implementations apply each
/// call atomically.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a session for `user` under a fresh token and return the token
    async fn create(&self, user: User) -> String;

    /// Look a token up; unknown or expired tokens yield `None`
    async fn get(&self, token: &str) -> Option<Session>;

    /// Remove a token, a no-op when it is unknown
    async fn delete(&self, token: &str);

    /// Replace the identity stored under `token`
    async fn update(&self, token: &str, user: User);

    /// Replace the identity in every live session of `user`
    async fn update_user(&self, user: &User);
}
