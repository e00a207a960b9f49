use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::RequireAuth;
use crate::domain::chat::{ChatMessage, Conversation, MessageCursor};
use crate::services::ChatService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenConversationRequest {
    pub participant_id: Uuid,
    pub property_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub content: String,
}

/// Polling cursor; `afterId` takes precedence over `after`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
    pub after: Option<DateTime<Utc>>,
    pub after_id: Option<Uuid>,
}

impl MessagesQuery {
    fn cursor(&self) -> Option<MessageCursor> {
        match (self.after_id, self.after) {
            (Some(id), _) => Some(MessageCursor::After(id)),
            (None, Some(since)) => Some(MessageCursor::Since(since)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub success: bool,
    pub conversation: Conversation,
}

#[derive(Debug, Serialize)]
pub struct ConversationListResponse {
    pub success: bool,
    pub conversations: Vec<Conversation>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: ChatMessage,
}

#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub success: bool,
    pub messages: Vec<ChatMessage>,
}

/// POST /chat/conversations
pub async fn open_conversation(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    payload: Result<Json<OpenConversationRequest>, JsonRejection>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let Json(req) = payload?;
    let conversation = ChatService::new(&state)
        .open(&ctx.user, req.participant_id, req.property_id)
        .await?;

    Ok(Json(ConversationResponse {
        success: true,
        conversation,
    }))
}

/// GET /chat/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
) -> Result<Json<ConversationListResponse>, ApiError> {
    let conversations = ChatService::new(&state).list(&ctx.user).await?;
    Ok(Json(ConversationListResponse {
        success: true,
        conversations,
    }))
}

/// GET /chat/conversations/:id/messages?afterId=<message id>&after=<rfc3339>
pub async fn list_messages(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<MessagesQuery>, QueryRejection>,
) -> Result<Json<MessageListResponse>, ApiError> {
    let Path(id) = id?;
    let Query(query) = query?;
    let messages = ChatService::new(&state)
        .messages(&ctx.user, id, query.cursor())
        .await?;

    Ok(Json(MessageListResponse {
        success: true,
        messages,
    }))
}

/// POST /chat/conversations/:id/messages
pub async fn send_message(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let message = ChatService::new(&state)
        .send(&ctx.user, id, &req.content)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            success: true,
            message,
        }),
    ))
}
