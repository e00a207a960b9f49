use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::chat::{ChatMessage, Conversation, MessageCursor};
use crate::domain::errors::StoreError;

/// Repository trait for conversations and their message logs
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Return the conversation between the two participants of `candidate`,
    /// inserting `candidate` when none exists
    async fn find_or_create_conversation(
        &self,
        candidate: Conversation,
    ) -> Result<Conversation, StoreError>;

    async fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>, StoreError>;

    /// Conversations a user takes part in, most recent activity first
    async fn list_conversations_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Conversation>, StoreError>;

    /// Append a message and bump the conversation's activity timestamp
    async fn append_message(&self, message: &ChatMessage) -> Result<(), StoreError>;

    /// Messages in append order, optionally only those past `cursor`
    ///
    /// `StoreError::NotFound` when an `After` cursor names a message that is
    /// not in this conversation.
    async fn list_messages(
        &self,
        conversation_id: Uuid,
        cursor: Option<MessageCursor>,
    ) -> Result<Vec<ChatMessage>, StoreError>;
}
