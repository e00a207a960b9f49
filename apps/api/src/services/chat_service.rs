use std::sync::Arc;
use uuid::Uuid;

use crate::domain::chat::{ChatMessage, Conversation, MessageCursor};
use crate::domain::errors::{AppError, AppResult, StoreError};
use crate::domain::repositories::{ChatRepository, PropertyRepository, UserRepository};
use crate::domain::user::User;
use crate::state::AppState;

/// Two-party conversations read by polling
pub struct ChatService {
    chat: Arc<dyn ChatRepository>,
    users: Arc<dyn UserRepository>,
    properties: Arc<dyn PropertyRepository>,
}

impl ChatService {
    pub fn new(state: &AppState) -> Self {
        Self {
            chat: Arc::clone(&state.chat),
            users: Arc::clone(&state.users),
            properties: Arc::clone(&state.properties),
        }
    }

    /// Returns the conversation between the caller and `participant_id`,
    /// opening it on first contact
    pub async fn open(
        &self,
        user: &User,
        participant_id: Uuid,
        property_id: Option<Uuid>,
    ) -> AppResult<Conversation> {
        let candidate = Conversation::open(user.id, participant_id, property_id)?;

        if self.users.find_by_id(participant_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "User not found: {}",
                participant_id
            )));
        }
        if let Some(property_id) = property_id {
            if self.properties.find_by_id(property_id).await?.is_none() {
                return Err(AppError::NotFound(format!(
                    "Property not found: {}",
                    property_id
                )));
            }
        }

        Ok(self.chat.find_or_create_conversation(candidate).await?)
    }

    pub async fn list(&self, user: &User) -> AppResult<Vec<Conversation>> {
        Ok(self.chat.list_conversations_for_user(user.id).await?)
    }

    async fn participant_conversation(&self, user: &User, id: Uuid) -> AppResult<Conversation> {
        let conversation = self
            .chat
            .find_conversation(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Conversation not found: {}", id)))?;

        if !conversation.includes(user.id) {
            return Err(AppError::Forbidden(
                "You are not a participant of this conversation".to_string(),
            ));
        }
        Ok(conversation)
    }

    pub async fn messages(
        &self,
        user: &User,
        conversation_id: Uuid,
        cursor: Option<MessageCursor>,
    ) -> AppResult<Vec<ChatMessage>> {
        self.participant_conversation(user, conversation_id).await?;
        match self.chat.list_messages(conversation_id, cursor).await {
            Ok(messages) => Ok(messages),
            Err(StoreError::NotFound) => Err(AppError::invalid(
                "afterId",
                "Message is not part of this conversation",
            )),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn send(&self, user: &User, conversation_id: Uuid, content: &str) -> AppResult<ChatMessage> {
        self.participant_conversation(user, conversation_id).await?;

        let message = ChatMessage::new(conversation_id, user.id, content)?;
        self.chat.append_message(&message).await?;

        tracing::debug!(%conversation_id, sender_id = %user.id, "chat message sent");
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::domain::user::Email;
    use crate::infrastructure::payments::MockPaymentProcessor;

    async fn users(state: &AppState) -> (User, User) {
        let a = User::new_viewer(Email::new("a@example.com").unwrap(), "h".into(), "A".into());
        let b = User::new_viewer(Email::new("b@example.com").unwrap(), "h".into(), "B".into());
        state.users.create(&a).await.unwrap();
        state.users.create(&b).await.unwrap();
        (a, b)
    }

    fn state() -> AppState {
        AppState::in_memory(AppConfig::test(), Arc::new(MockPaymentProcessor::new()))
    }

    #[tokio::test]
    async fn open_is_symmetric() {
        let state = state();
        let (a, b) = users(&state).await;
        let service = ChatService::new(&state);

        let first = service.open(&a, b.id, None).await.unwrap();
        let second = service.open(&b, a.id, None).await.unwrap();

        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn open_rejects_self_and_strangers() {
        let state = state();
        let (a, _) = users(&state).await;
        let service = ChatService::new(&state);

        assert!(matches!(
            service.open(&a, a.id, None).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.open(&a, Uuid::new_v4(), None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn outsiders_cannot_read_or_write() {
        let state = state();
        let (a, b) = users(&state).await;
        let outsider = User::new_viewer(Email::new("c@example.com").unwrap(), "h".into(), "C".into());
        let service = ChatService::new(&state);
        let conversation = service.open(&a, b.id, None).await.unwrap();

        assert!(matches!(
            service.send(&outsider, conversation.id, "oi").await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.messages(&outsider, conversation.id, None).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn polling_returns_only_newer_messages() {
        let state = state();
        let (a, b) = users(&state).await;
        let service = ChatService::new(&state);
        let conversation = service.open(&a, b.id, None).await.unwrap();

        let first = service.send(&a, conversation.id, "Olá!").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        service.send(&b, conversation.id, "Oi, tudo bem?").await.unwrap();

        let all = service.messages(&b, conversation.id, None).await.unwrap();
        let newer = service
            .messages(&a, conversation.id, Some(MessageCursor::Since(first.created_at)))
            .await
            .unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(newer.len(), 1);
        assert_eq!(newer[0].sender_id, b.id);
    }

    #[tokio::test]
    async fn polling_by_message_id_sees_every_later_message() {
        let state = state();
        let (a, b) = users(&state).await;
        let service = ChatService::new(&state);
        let conversation = service.open(&a, b.id, None).await.unwrap();

        let first = service.send(&a, conversation.id, "Olá!").await.unwrap();
        let second = service.send(&b, conversation.id, "Oi").await.unwrap();
        let third = service.send(&b, conversation.id, "Tudo bem?").await.unwrap();

        let newer = service
            .messages(&a, conversation.id, Some(MessageCursor::After(first.id)))
            .await
            .unwrap();
        let ids: Vec<Uuid> = newer.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![second.id, third.id]);

        assert!(matches!(
            service
                .messages(&a, conversation.id, Some(MessageCursor::After(Uuid::new_v4())))
                .await,
            Err(AppError::Validation(_))
        ));
    }
}
