//! Axum route handlers for chats and the relay endpoint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::middleware::Claims;
use crate::chat::relay::{run_relay, RelayRequest, RelayResponse};
use crate::errors::AppError;
use crate::models::chat::{ChatRow, MessageRow};
use crate::state::AppState;

/// POST /api/v1/chat
///
/// The relay function: forwards the message array to the completion
/// endpoint and, when `chat_id` is present, persists the turn.
pub async fn handle_chat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<RelayRequest>,
) -> Result<Json<RelayResponse>, AppError> {
    let response = run_relay(&state.db, &state.llm, claims.sub, req).await?;
    Ok(Json(response))
}

/// GET /api/v1/chats
pub async fn list_chats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ChatRow>>, AppError> {
    let chats: Vec<ChatRow> = sqlx::query_as(
        "SELECT * FROM chats WHERE user_id = $1 AND is_archived = FALSE ORDER BY updated_at DESC",
    )
    .bind(claims.sub)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(chats))
}

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    pub title: String,
}

/// POST /api/v1/chats
///
/// Chats are created on first send, never on a bare "New chat" click — the
/// client calls this together with the first relay turn.
pub async fn create_chat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateChatRequest>,
) -> Result<(StatusCode, Json<ChatRow>), AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }

    let chat: ChatRow = sqlx::query_as(
        "INSERT INTO chats (id, user_id, title) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(claims.sub)
    .bind(req.title.trim())
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(chat)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateChatRequest {
    pub title: Option<String>,
    pub is_pinned: Option<bool>,
    pub is_archived: Option<bool>,
}

/// PATCH /api/v1/chats/:id
pub async fn update_chat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(chat_id): Path<Uuid>,
    Json(req): Json<UpdateChatRequest>,
) -> Result<Json<ChatRow>, AppError> {
    let chat: Option<ChatRow> = sqlx::query_as(
        r#"
        UPDATE chats
        SET title = COALESCE($1, title),
            is_pinned = COALESCE($2, is_pinned),
            is_archived = COALESCE($3, is_archived)
        WHERE id = $4 AND user_id = $5
        RETURNING *
        "#,
    )
    .bind(&req.title)
    .bind(req.is_pinned)
    .bind(req.is_archived)
    .bind(chat_id)
    .bind(claims.sub)
    .fetch_optional(&state.db)
    .await?;

    chat.map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Chat {chat_id} not found")))
}

/// DELETE /api/v1/chats/:id
pub async fn delete_chat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(chat_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM chats WHERE id = $1 AND user_id = $2")
        .bind(chat_id)
        .bind(claims.sub)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Chat {chat_id} not found")));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/chats/:id/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Vec<MessageRow>>, AppError> {
    let chat: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM chats WHERE id = $1 AND user_id = $2")
            .bind(chat_id)
            .bind(claims.sub)
            .fetch_optional(&state.db)
            .await?;
    if chat.is_none() {
        return Err(AppError::NotFound(format!("Chat {chat_id} not found")));
    }

    let messages: Vec<MessageRow> =
        sqlx::query_as("SELECT * FROM messages WHERE chat_id = $1 ORDER BY created_at ASC")
            .bind(chat_id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(messages))
}

/// POST /api/v1/chats/archive-all
pub async fn archive_all_chats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, AppError> {
    sqlx::query("UPDATE chats SET is_archived = TRUE WHERE user_id = $1 AND is_archived = FALSE")
        .bind(claims.sub)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/chats
pub async fn delete_all_chats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, AppError> {
    sqlx::query("DELETE FROM chats WHERE user_id = $1")
        .bind(claims.sub)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
