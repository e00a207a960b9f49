// Chat domain
// Append-only conversations between two users, read by polling

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::errors::AppError;

pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// A conversation between exactly two users, optionally about a listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub participants: [Uuid; 2],
    pub property_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Opens a conversation; participants are stored in a canonical order
    pub fn open(a: Uuid, b: Uuid, property_id: Option<Uuid>) -> Result<Self, AppError> {
        if a == b {
            return Err(AppError::invalid(
                "participantId",
                "Cannot start a conversation with yourself",
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            participants: Self::canonical(a, b),
            property_id,
            created_at: Utc::now(),
            last_message_at: None,
        })
    }

    pub fn canonical(a: Uuid, b: Uuid) -> [Uuid; 2] {
        if a <= b {
            [a, b]
        } else {
            [b, a]
        }
    }

    pub fn includes(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }

    /// Last activity, used to sort conversation lists
    pub fn activity_at(&self) -> DateTime<Utc> {
        self.last_message_at.unwrap_or(self.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(conversation_id: Uuid, sender_id: Uuid, content: &str) -> Result<Self, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::invalid("content", "Message cannot be empty"));
        }
        if content.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(AppError::invalid(
                "content",
                format!("Message cannot exceed {} characters", MAX_MESSAGE_LENGTH),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            content: content.to_string(),
            created_at: Utc::now(),
        })
    }
}

/// Where a polling client resumes reading a message log
///
/// `After` names the last message the client has seen and never skips a
/// message stored with the same timestamp. `Since` compares timestamps only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageCursor {
    Since(DateTime<Utc>),
    After(Uuid),
}
