use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::auth::session_token::generate_session_token;
use crate::domain::repositories::SessionStore;
use crate::domain::session::Session;
use crate::domain::user::User;

/// Process-local session store
///
/// Sessions do not survive a restart. With a TTL configured, expired
/// entries are dropped on lookup and swept every [`PRUNE_INTERVAL`]
/// creations, so abandoned tokens do not pile up.
pub struct InMemorySessionStore {
    sessions: DashMap<String, Session>,
    ttl: Option<Duration>,
    created: AtomicUsize,
}

pub const PRUNE_INTERVAL: usize = 64;

impl InMemorySessionStore {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
            created: AtomicUsize::new(0),
        }
    }

    /// Drops every session expired at `now`, returning how many went
    pub fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(now));
        let pruned = before.saturating_sub(self.sessions.len());
        if pruned > 0 {
            tracing::debug!(pruned, "expired sessions pruned");
        }
        pruned
    }

    /// Number of stored sessions, expired ones included
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, user: User) -> String {
        let now = Utc::now();
        let created = self.created.fetch_add(1, Ordering::Relaxed) + 1;
        if self.ttl.is_some() && created % PRUNE_INTERVAL == 0 {
            self.prune_expired(now);
        }

        loop {
            let token = generate_session_token();
            // retry on collision, the entry API keeps check-and-insert atomic
            if let dashmap::mapref::entry::Entry::Vacant(slot) = self.sessions.entry(token.clone()) {
                slot.insert(Session {
                    token: token.clone(),
                    user_id: user.id,
                    user,
                    created_at: now,
                    expires_at: self.ttl.map(|ttl| now + ttl),
                });
                tracing::debug!(token_prefix = &token[..6], "session created");
                return token;
            }
        }
    }

    async fn get(&self, token: &str) -> Option<Session> {
        let session = self.sessions.get(token).map(|entry| entry.value().clone())?;
        if session.is_expired(Utc::now()) {
            self.sessions.remove(token);
            return None;
        }
        Some(session)
    }

    async fn delete(&self, token: &str) {
        self.sessions.remove(token);
    }

    async fn update(&self, token: &str, user: User) {
        if let Some(mut entry) = self.sessions.get_mut(token) {
            entry.user_id = user.id;
            entry.user = user;
        }
    }

    async fn update_user(&self, user: &User) {
        for mut entry in self.sessions.iter_mut() {
            if entry.user_id == user.id {
                entry.user = user.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::Email;

    fn user(name: &str) -> User {
        User::new_viewer(
            Email::new(format!("{}@example.com", name)).unwrap(),
            "hash".to_string(),
            name.to_string(),
        )
    }

    #[tokio::test]
    async fn create_then_get() {
        let store = InMemorySessionStore::new(None);
        let ana = user("ana");

        let token = store.create(ana.clone()).await;
        let session = store.get(&token).await.expect("session");

        assert_eq!(session.user_id, ana.id);
        assert_eq!(session.user.name, "ana");
        assert!(session.expires_at.is_none());
    }

    #[tokio::test]
    async fn deleted_session_is_gone() {
        let store = InMemorySessionStore::new(None);
        let token = store.create(user("ana")).await;

        store.delete(&token).await;

        assert!(store.get(&token).await.is_none());
        // idempotent
        store.delete(&token).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn unknown_token_is_none() {
        let store = InMemorySessionStore::new(None);
        assert!(store.get("nope").await.is_none());
    }

    #[tokio::test]
    async fn tokens_are_unique_per_login() {
        let store = InMemorySessionStore::new(None);
        let ana = user("ana");
        let first = store.create(ana.clone()).await;
        let second = store.create(ana).await;
        assert_ne!(first, second);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn update_replaces_identity() {
        let store = InMemorySessionStore::new(None);
        let mut ana = user("ana");
        let token = store.create(ana.clone()).await;

        ana.name = "Ana Maria".to_string();
        store.update(&token, ana).await;

        assert_eq!(store.get(&token).await.unwrap().user.name, "Ana Maria");
    }

    #[tokio::test]
    async fn update_user_refreshes_every_session_of_that_user() {
        let store = InMemorySessionStore::new(None);
        let mut ana = user("ana");
        let bob = user("bob");
        let t1 = store.create(ana.clone()).await;
        let t2 = store.create(ana.clone()).await;
        let t3 = store.create(bob).await;

        ana.name = "Renamed".to_string();
        store.update_user(&ana).await;

        assert_eq!(store.get(&t1).await.unwrap().user.name, "Renamed");
        assert_eq!(store.get(&t2).await.unwrap().user.name, "Renamed");
        assert_eq!(store.get(&t3).await.unwrap().user.name, "bob");
    }

    #[tokio::test]
    async fn expired_sessions_are_dropped() {
        let store = InMemorySessionStore::new(Some(Duration::zero()));
        let token = store.create(user("ana")).await;

        assert!(store.get(&token).await.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn abandoned_sessions_are_swept_on_create() {
        let store = InMemorySessionStore::new(Some(Duration::zero()));
        for i in 0..PRUNE_INTERVAL - 1 {
            store.create(user(&format!("u{}", i))).await;
        }
        assert_eq!(store.len(), PRUNE_INTERVAL - 1);

        let token = store.create(user("last")).await;

        assert_eq!(store.len(), 1);
        assert!(store.sessions.contains_key(&token));
    }

    #[tokio::test]
    async fn prune_keeps_live_sessions() {
        let store = InMemorySessionStore::new(Some(Duration::hours(1)));
        let token = store.create(user("ana")).await;

        assert_eq!(store.prune_expired(Utc::now()), 0);
        assert_eq!(store.prune_expired(Utc::now() + Duration::hours(2)), 1);
        assert!(store.get(&token).await.is_none());
    }
}
