use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::chat::{ChatMessage, Conversation, MessageCursor};
use crate::domain::errors::StoreError;
use crate::domain::repositories::ChatRepository;

/// PostgreSQL implementation of ChatRepository
pub struct PostgresChatRepository {
    pool: PgPool,
}

impl PostgresChatRepository {
    /// Creates a new PostgresChatRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_CONVERSATION: &str = r#"
    SELECT id, participant_a, participant_b, property_id, created_at, last_message_at
    FROM conversations
"#;

#[derive(FromRow)]
struct ConversationRow {
    id: Uuid,
    participant_a: Uuid,
    participant_b: Uuid,
    property_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    last_message_at: Option<DateTime<Utc>>,
}

impl From<ConversationRow> for Conversation {
    fn from(r: ConversationRow) -> Self {
        Conversation {
            id: r.id,
            participants: [r.participant_a, r.participant_b],
            property_id: r.property_id,
            created_at: r.created_at,
            last_message_at: r.last_message_at,
        }
    }
}

#[derive(FromRow)]
struct MessageRow {
    id: Uuid,
    conversation_id: Uuid,
    sender_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for ChatMessage {
    fn from(r: MessageRow) -> Self {
        ChatMessage {
            id: r.id,
            conversation_id: r.conversation_id,
            sender_id: r.sender_id,
            content: r.content,
            created_at: r.created_at,
        }
    }
}

#[async_trait]
impl ChatRepository for PostgresChatRepository {
    async fn find_or_create_conversation(
        &self,
        candidate: Conversation,
    ) -> Result<Conversation, StoreError> {
        let [a, b] = candidate.participants;

        sqlx::query(
            r#"
            INSERT INTO conversations (id, participant_a, participant_b, property_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (participant_a, participant_b) DO NOTHING
            "#,
        )
        .bind(candidate.id)
        .bind(a)
        .bind(b)
        .bind(candidate.property_id)
        .bind(candidate.created_at)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, ConversationRow>(&format!(
            "{} WHERE participant_a = $1 AND participant_b = $2",
            SELECT_CONVERSATION
        ))
        .bind(a)
        .bind(b)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query_as::<_, ConversationRow>(&format!(
            "{} WHERE id = $1",
            SELECT_CONVERSATION
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Conversation::from))
    }

    async fn list_conversations_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Conversation>, StoreError> {
        let rows = sqlx::query_as::<_, ConversationRow>(&format!(
            "{} WHERE participant_a = $1 OR participant_b = $1 \
             ORDER BY COALESCE(last_message_at, created_at) DESC",
            SELECT_CONVERSATION
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Conversation::from).collect())
    }

    async fn append_message(&self, message: &ChatMessage) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO chat_messages (id, conversation_id, sender_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(message.id)
        .bind(message.conversation_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE conversations SET last_message_at = $2 WHERE id = $1")
            .bind(message.conversation_id)
            .bind(message.created_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_messages(
        &self,
        conversation_id: Uuid,
        cursor: Option<MessageCursor>,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let (since, after_seq) = match cursor {
            None => (None, None),
            Some(MessageCursor::Since(since)) => (Some(since), None),
            Some(MessageCursor::After(id)) => {
                let seq: i64 = sqlx::query_scalar(
                    "SELECT seq FROM chat_messages WHERE id = $1 AND conversation_id = $2",
                )
                .bind(id)
                .bind(conversation_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(StoreError::NotFound)?;
                (None, Some(seq))
            }
        };

        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, conversation_id, sender_id, content, created_at
            FROM chat_messages
            WHERE conversation_id = $1
              AND ($2::timestamptz IS NULL OR created_at > $2)
              AND ($3::bigint IS NULL OR seq > $3)
            ORDER BY seq ASC
            "#,
        )
        .bind(conversation_id)
        .bind(since)
        .bind(after_seq)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ChatMessage::from).collect())
    }
}
