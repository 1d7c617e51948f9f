//! Shared-conversation links: a chat owner mints an opaque token, anyone
//! holding the token can read the conversation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::middleware::Claims;
use crate::errors::AppError;
use crate::models::chat::{ChatRow, MessageRow, SharedConversationRow};
use crate::state::AppState;

const SHARE_TOKEN_LEN: usize = 32;
const SHARE_TOKEN_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

fn generate_share_token() -> String {
    let mut rng = rand::thread_rng();
    (0..SHARE_TOKEN_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..SHARE_TOKEN_CHARSET.len());
            SHARE_TOKEN_CHARSET[idx] as char
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct ShareLinkResponse {
    pub share_token: String,
}

/// POST /api/v1/chats/:id/share
pub async fn create_share_link(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(chat_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ShareLinkResponse>), AppError> {
    let owned: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM chats WHERE id = $1 AND user_id = $2")
            .bind(chat_id)
            .bind(claims.sub)
            .fetch_optional(&state.db)
            .await?;
    if owned.is_none() {
        return Err(AppError::NotFound(format!("Chat {chat_id} not found")));
    }

    let share_token = generate_share_token();
    sqlx::query(
        "INSERT INTO shared_conversations (id, chat_id, share_token, is_public) VALUES ($1, $2, $3, TRUE)",
    )
    .bind(Uuid::new_v4())
    .bind(chat_id)
    .bind(&share_token)
    .execute(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(ShareLinkResponse { share_token })))
}

#[derive(Debug, Serialize)]
pub struct SharedConversationResponse {
    pub chat: ChatRow,
    pub messages: Vec<MessageRow>,
}

/// GET /api/v1/share/:token — public, no auth.
pub async fn get_shared_conversation(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<SharedConversationResponse>, AppError> {
    let share: Option<SharedConversationRow> = sqlx::query_as(
        r#"
        SELECT * FROM shared_conversations
        WHERE share_token = $1
          AND is_public = TRUE
          AND (expires_at IS NULL OR expires_at > now())
        "#,
    )
    .bind(&token)
    .fetch_optional(&state.db)
    .await?;
    let share = share.ok_or_else(|| AppError::NotFound("Share not found".to_string()))?;

    let chat: Option<ChatRow> = sqlx::query_as("SELECT * FROM chats WHERE id = $1")
        .bind(share.chat_id)
        .fetch_optional(&state.db)
        .await?;
    let chat = chat.ok_or_else(|| AppError::NotFound("Chat not found".to_string()))?;

    let messages: Vec<MessageRow> =
        sqlx::query_as("SELECT * FROM messages WHERE chat_id = $1 ORDER BY created_at ASC")
            .bind(share.chat_id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(SharedConversationResponse { chat, messages }))
}

/// DELETE /api/v1/chats/:id/share
pub async fn delete_share_link(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(chat_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let owned: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM chats WHERE id = $1 AND user_id = $2")
            .bind(chat_id)
            .bind(claims.sub)
            .fetch_optional(&state.db)
            .await?;
    if owned.is_none() {
        return Err(AppError::NotFound(format!("Chat {chat_id} not found")));
    }

    sqlx::query("DELETE FROM shared_conversations WHERE chat_id = $1")
        .bind(chat_id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_tokens_have_expected_length_and_charset() {
        let token = generate_share_token();
        assert_eq!(token.len(), SHARE_TOKEN_LEN);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn share_tokens_are_unique_enough() {
        let a = generate_share_token();
        let b = generate_share_token();
        assert_ne!(a, b);
    }
}
