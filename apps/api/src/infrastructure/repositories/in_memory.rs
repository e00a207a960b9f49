//! In-memory repository implementations
//!
//! Used when no database is configured and by the test suite. Each
//! collection sits behind a `tokio::sync::RwLock`, so every repository call
//! is applied atomically with respect to concurrent requests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::chat::{ChatMessage, Conversation, MessageCursor};
use crate::domain::errors::{AppError, StoreError};
use crate::domain::property::{Property, PropertyFilter};
use crate::domain::repositories::{
    ChatRepository, PropertyRepository, SubscriptionRepository, UserEdit, UserRepository,
};
use crate::domain::subscription::Subscription;
use crate::domain::user::{Email, User};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> Result<Uuid, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "email {} already registered",
                user.email
            )));
        }
        if users.contains_key(&user.id) {
            return Err(StoreError::Conflict(format!("user {} exists", user.id)));
        }
        users.insert(user.id, user.clone());
        Ok(user.id)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        replace_user(&mut users, user.clone())
    }

    async fn modify(&self, id: Uuid, edit: UserEdit) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        let mut user = users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User not found: {}", id)))?;

        edit(&mut user)?;
        replace_user(&mut users, user.clone())?;
        Ok(user)
    }
}

fn replace_user(users: &mut HashMap<Uuid, User>, user: User) -> Result<(), StoreError> {
    if users
        .values()
        .any(|u| u.id != user.id && u.email == user.email)
    {
        return Err(StoreError::Conflict(format!(
            "email {} already registered",
            user.email
        )));
    }
    match users.get_mut(&user.id) {
        Some(stored) => {
            *stored = user;
            Ok(())
        }
        None => Err(StoreError::NotFound),
    }
}

#[derive(Default)]
pub struct InMemoryPropertyRepository {
    properties: RwLock<HashMap<Uuid, Property>>,
}

impl InMemoryPropertyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut properties: Vec<Property>) -> Vec<Property> {
    properties.sort_by(|a, b| {
        b.featured
            .cmp(&a.featured)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    properties
}

#[async_trait]
impl PropertyRepository for InMemoryPropertyRepository {
    async fn create(&self, property: &Property) -> Result<(), StoreError> {
        let mut properties = self.properties.write().await;
        if properties.contains_key(&property.id) {
            return Err(StoreError::Conflict(format!(
                "property {} exists",
                property.id
            )));
        }
        properties.insert(property.id, property.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>, StoreError> {
        Ok(self.properties.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: &PropertyFilter) -> Result<Vec<Property>, StoreError> {
        let properties = self.properties.read().await;
        Ok(newest_first(
            properties
                .values()
                .filter(|p| filter.matches(p))
                .cloned()
                .collect(),
        ))
    }

    async fn list_by_agency(&self, agency_id: Uuid) -> Result<Vec<Property>, StoreError> {
        let properties = self.properties.read().await;
        let mut owned: Vec<Property> = properties
            .values()
            .filter(|p| p.agency_id == agency_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn count_by_agency(&self, agency_id: Uuid) -> Result<u64, StoreError> {
        let properties = self.properties.read().await;
        Ok(properties
            .values()
            .filter(|p| p.agency_id == agency_id)
            .count() as u64)
    }

    async fn increment_views(&self, id: Uuid) -> Result<i64, StoreError> {
        let mut properties = self.properties.write().await;
        let property = properties.get_mut(&id).ok_or(StoreError::NotFound)?;
        property.views += 1;
        Ok(property.views)
    }
}

#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    subscriptions: RwLock<HashMap<Uuid, Subscription>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn create(&self, subscription: &Subscription) -> Result<(), StoreError> {
        let mut subscriptions = self.subscriptions.write().await;
        if subscriptions
            .values()
            .any(|s| s.payment_intent_id() == subscription.payment_intent_id())
        {
            return Err(StoreError::Conflict(format!(
                "payment intent {} already used",
                subscription.payment_intent_id()
            )));
        }
        subscriptions.insert(subscription.id(), subscription.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subscription>, StoreError> {
        Ok(self.subscriptions.read().await.get(&id).cloned())
    }

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<Subscription>, StoreError> {
        Ok(self
            .subscriptions
            .read()
            .await
            .values()
            .find(|s| s.payment_intent_id() == payment_intent_id)
            .cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Subscription>, StoreError> {
        let subscriptions = self.subscriptions.read().await;
        let mut owned: Vec<Subscription> = subscriptions
            .values()
            .filter(|s| s.user_id() == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.start_date().cmp(&a.start_date()));
        Ok(owned)
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), StoreError> {
        let mut subscriptions = self.subscriptions.write().await;
        match subscriptions.get_mut(&subscription.id()) {
            Some(stored) => {
                *stored = subscription.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }
}

#[derive(Default)]
struct ChatState {
    conversations: HashMap<Uuid, Conversation>,
    messages: HashMap<Uuid, Vec<ChatMessage>>,
}

#[derive(Default)]
pub struct InMemoryChatRepository {
    state: RwLock<ChatState>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn find_or_create_conversation(
        &self,
        candidate: Conversation,
    ) -> Result<Conversation, StoreError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state
            .conversations
            .values()
            .find(|c| c.participants == candidate.participants)
        {
            return Ok(existing.clone());
        }
        state
            .conversations
            .insert(candidate.id, candidate.clone());
        Ok(candidate)
    }

    async fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>, StoreError> {
        Ok(self.state.read().await.conversations.get(&id).cloned())
    }

    async fn list_conversations_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Conversation>, StoreError> {
        let state = self.state.read().await;
        let mut conversations: Vec<Conversation> = state
            .conversations
            .values()
            .filter(|c| c.includes(user_id))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.activity_at().cmp(&a.activity_at()));
        Ok(conversations)
    }

    async fn append_message(&self, message: &ChatMessage) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let conversation = state
            .conversations
            .get_mut(&message.conversation_id)
            .ok_or(StoreError::NotFound)?;
        conversation.last_message_at = Some(message.created_at);
        state
            .messages
            .entry(message.conversation_id)
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn list_messages(
        &self,
        conversation_id: Uuid,
        cursor: Option<MessageCursor>,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let state = self.state.read().await;
        let log = match state.messages.get(&conversation_id) {
            Some(log) => log.as_slice(),
            None if matches!(cursor, Some(MessageCursor::After(_))) => {
                return Err(StoreError::NotFound)
            }
            None => return Ok(Vec::new()),
        };

        let messages = match cursor {
            None => log.to_vec(),
            Some(MessageCursor::Since(since)) => log
                .iter()
                .filter(|m| m.created_at > since)
                .cloned()
                .collect(),
            Some(MessageCursor::After(id)) => {
                let seen = log
                    .iter()
                    .position(|m| m.id == id)
                    .ok_or(StoreError::NotFound)?;
                log[seen + 1..].to_vec()
            }
        };
        Ok(messages)
    }
}
