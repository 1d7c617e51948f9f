//! Chat relay — the path behind every chat turn.
//!
//! Flow: validate → forward message array to the completion endpoint →
//! scrub the reply → persist the exchange (when a chat id is given) →
//! return the reply text.
//!
//! Persistence happens strictly after a successful completion, so an
//! upstream failure never writes rows. There is no retry and no backoff;
//! upstream errors carry their original status and body to the caller.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::chat::scrub::scrub_action_leakage;
use crate::errors::AppError;
use crate::llm_client::{ChatMessage, CompletionClient, CompletionOptions, CHAT_MODEL};
use crate::models::chat::{Attachment, ChatRow};

/// One element of the incoming `messages` array. Attachments ride along for
/// persistence but are never forwarded upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayMessage {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    #[serde(default)]
    pub messages: Vec<RelayMessage>,
    #[serde(default)]
    pub chat_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct RelayResponse {
    pub message: String,
}

pub async fn run_relay(
    pool: &PgPool,
    llm: &CompletionClient,
    user_id: Uuid,
    req: RelayRequest,
) -> Result<RelayResponse, AppError> {
    let latest = match req.messages.last() {
        Some(m) => m.clone(),
        None => {
            return Err(AppError::Validation(
                "Messages array is required".to_string(),
            ))
        }
    };

    let upstream: Vec<ChatMessage> = req
        .messages
        .iter()
        .map(|m| ChatMessage {
            role: m.role.clone(),
            content: m.content.clone(),
        })
        .collect();

    let completion = llm
        .complete(CHAT_MODEL, &upstream, CompletionOptions::default())
        .await?;
    let reply = scrub_action_leakage(&completion);

    if let Some(chat_id) = req.chat_id {
        persist_turn(pool, user_id, chat_id, &latest, &reply).await?;
    }

    Ok(RelayResponse { message: reply })
}

/// Appends the user/assistant row pair and bumps the chat's updated_at.
/// The chat must belong to the caller.
async fn persist_turn(
    pool: &PgPool,
    user_id: Uuid,
    chat_id: Uuid,
    latest: &RelayMessage,
    reply: &str,
) -> Result<(), AppError> {
    let chat: Option<ChatRow> =
        sqlx::query_as("SELECT * FROM chats WHERE id = $1 AND user_id = $2")
            .bind(chat_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    if chat.is_none() {
        return Err(AppError::NotFound(format!("Chat {chat_id} not found")));
    }

    let attachments = latest
        .attachments
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("attachment serialization failed: {e}")))?;

    // User row first, assistant row second: listing orders by created_at.
    sqlx::query(
        "INSERT INTO messages (id, chat_id, role, content, attachments) VALUES ($1, $2, 'user', $3, $4)",
    )
    .bind(Uuid::new_v4())
    .bind(chat_id)
    .bind(&latest.content)
    .bind(&attachments)
    .execute(pool)
    .await?;

    sqlx::query("INSERT INTO messages (id, chat_id, role, content) VALUES ($1, $2, 'assistant', $3)")
        .bind(Uuid::new_v4())
        .bind(chat_id)
        .bind(reply)
        .execute(pool)
        .await?;

    sqlx::query("UPDATE chats SET updated_at = now() WHERE id = $1")
        .bind(chat_id)
        .execute(pool)
        .await?;

    info!("Persisted chat turn for chat {chat_id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_request_accepts_bare_role_content_pairs() {
        let json = serde_json::json!({
            "messages": [
                {"role": "user", "content": "Kijan ou ye?"},
                {"role": "assistant", "content": "Mwen byen, mèsi!"},
                {"role": "user", "content": "What can you do?"}
            ]
        });
        let request: RelayRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.messages.len(), 3);
        assert!(request.chat_id.is_none());
        assert!(request.messages[0].attachments.is_none());
    }

    #[test]
    fn relay_request_carries_attachments_for_persistence() {
        let json = serde_json::json!({
            "messages": [{
                "role": "user",
                "content": "Describe this photo",
                "attachments": [{"url": "https://files.test/a.png", "name": "a.png", "type": "image/png"}]
            }],
            "chatId": Uuid::new_v4()
        });
        let request: RelayRequest = serde_json::from_value(json).unwrap();
        let attachments = request.messages[0].attachments.as_ref().unwrap();
        assert_eq!(attachments[0].mime_type, "image/png");
        assert!(request.chat_id.is_some());
    }

    #[test]
    fn missing_messages_field_deserializes_to_empty_array() {
        // The handler turns this into a 400 before any upstream call.
        let request: RelayRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(request.messages.is_empty());
    }
}
