//! Settings surface: user preferences, family members, orders, data export.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::middleware::Claims;
use crate::errors::AppError;
use crate::models::chat::{ChatRow, MessageRow};
use crate::models::settings::{FamilyMemberRow, OrderRow, UserPreferencesRow};
use crate::state::AppState;

/// GET /api/v1/settings/preferences
///
/// Get-or-create: a missing row is created from database defaults, so every
/// account observes a preferences row on first read.
pub async fn get_preferences(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserPreferencesRow>, AppError> {
    let existing: Option<UserPreferencesRow> =
        sqlx::query_as("SELECT * FROM user_preferences WHERE user_id = $1")
            .bind(claims.sub)
            .fetch_optional(&state.db)
            .await?;

    if let Some(preferences) = existing {
        return Ok(Json(preferences));
    }

    let created: UserPreferencesRow =
        sqlx::query_as("INSERT INTO user_preferences (id, user_id) VALUES ($1, $2) RETURNING *")
            .bind(Uuid::new_v4())
            .bind(claims.sub)
            .fetch_one(&state.db)
            .await?;

    Ok(Json(created))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePreferencesRequest {
    pub base_style_tone: Option<String>,
    pub custom_instructions: Option<String>,
    pub about_you_nickname: Option<String>,
    pub about_you_occupation: Option<String>,
    pub about_you_more: Option<String>,
    pub reference_saved_memories: Option<bool>,
    pub reference_chat_history: Option<bool>,
    pub appearance: Option<String>,
    pub accent_color: Option<String>,
    pub language: Option<String>,
    pub spoken_language: Option<String>,
    pub voice: Option<String>,
    pub web_search: Option<bool>,
    pub code_interpreter: Option<bool>,
    pub canvas: Option<bool>,
    pub voice_mode: Option<bool>,
    pub notif_responses: Option<String>,
    pub notif_tasks: Option<String>,
    pub notif_projects: Option<String>,
    pub improve_model: Option<bool>,
}

/// PATCH /api/v1/settings/preferences
pub async fn update_preferences(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdatePreferencesRequest>,
) -> Result<Json<UserPreferencesRow>, AppError> {
    let updated: Option<UserPreferencesRow> = sqlx::query_as(
        r#"
        UPDATE user_preferences
        SET base_style_tone = COALESCE($1, base_style_tone),
            custom_instructions = COALESCE($2, custom_instructions),
            about_you_nickname = COALESCE($3, about_you_nickname),
            about_you_occupation = COALESCE($4, about_you_occupation),
            about_you_more = COALESCE($5, about_you_more),
            reference_saved_memories = COALESCE($6, reference_saved_memories),
            reference_chat_history = COALESCE($7, reference_chat_history),
            appearance = COALESCE($8, appearance),
            accent_color = COALESCE($9, accent_color),
            language = COALESCE($10, language),
            spoken_language = COALESCE($11, spoken_language),
            voice = COALESCE($12, voice),
            web_search = COALESCE($13, web_search),
            code_interpreter = COALESCE($14, code_interpreter),
            canvas = COALESCE($15, canvas),
            voice_mode = COALESCE($16, voice_mode),
            notif_responses = COALESCE($17, notif_responses),
            notif_tasks = COALESCE($18, notif_tasks),
            notif_projects = COALESCE($19, notif_projects),
            improve_model = COALESCE($20, improve_model),
            updated_at = now()
        WHERE user_id = $21
        RETURNING *
        "#,
    )
    .bind(&req.base_style_tone)
    .bind(&req.custom_instructions)
    .bind(&req.about_you_nickname)
    .bind(&req.about_you_occupation)
    .bind(&req.about_you_more)
    .bind(req.reference_saved_memories)
    .bind(req.reference_chat_history)
    .bind(&req.appearance)
    .bind(&req.accent_color)
    .bind(&req.language)
    .bind(&req.spoken_language)
    .bind(&req.voice)
    .bind(req.web_search)
    .bind(req.code_interpreter)
    .bind(req.canvas)
    .bind(req.voice_mode)
    .bind(&req.notif_responses)
    .bind(&req.notif_tasks)
    .bind(&req.notif_projects)
    .bind(req.improve_model)
    .bind(claims.sub)
    .fetch_optional(&state.db)
    .await?;

    updated
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Preferences not found".to_string()))
}

/// GET /api/v1/settings/family
pub async fn list_family_members(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<FamilyMemberRow>>, AppError> {
    let members: Vec<FamilyMemberRow> = sqlx::query_as(
        "SELECT * FROM family_members WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(claims.sub)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(members))
}

#[derive(Debug, Deserialize)]
pub struct AddFamilyMemberRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: String,
}

/// POST /api/v1/settings/family
pub async fn add_family_member(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddFamilyMemberRequest>,
) -> Result<(StatusCode, Json<FamilyMemberRow>), AppError> {
    if req.role != "parent" && req.role != "child" {
        return Err(AppError::Validation(
            "role must be 'parent' or 'child'".to_string(),
        ));
    }
    if req.email.is_none() && req.phone.is_none() {
        return Err(AppError::Validation(
            "an email or phone number is required".to_string(),
        ));
    }

    let member: FamilyMemberRow = sqlx::query_as(
        r#"
        INSERT INTO family_members (id, user_id, email, phone, role, status)
        VALUES ($1, $2, $3, $4, $5, 'pending')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(claims.sub)
    .bind(&req.email)
    .bind(&req.phone)
    .bind(&req.role)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(member)))
}

/// DELETE /api/v1/settings/family/:id
pub async fn remove_family_member(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(member_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM family_members WHERE id = $1 AND user_id = $2")
        .bind(member_id)
        .bind(claims.sub)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Family member {member_id} not found"
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/settings/orders
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<OrderRow>>, AppError> {
    let orders: Vec<OrderRow> =
        sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(claims.sub)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(orders))
}

/// GET /api/v1/settings/export
///
/// One JSON document with everything the account owns: chats, messages,
/// preferences.
pub async fn export_data(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, AppError> {
    let chats: Vec<ChatRow> = sqlx::query_as("SELECT * FROM chats WHERE user_id = $1")
        .bind(claims.sub)
        .fetch_all(&state.db)
        .await?;

    let messages: Vec<MessageRow> = sqlx::query_as(
        r#"
        SELECT m.* FROM messages m
        JOIN chats c ON c.id = m.chat_id
        WHERE c.user_id = $1
        ORDER BY m.created_at ASC
        "#,
    )
    .bind(claims.sub)
    .fetch_all(&state.db)
    .await?;

    let preferences: Option<UserPreferencesRow> =
        sqlx::query_as("SELECT * FROM user_preferences WHERE user_id = $1")
            .bind(claims.sub)
            .fetch_optional(&state.db)
            .await?;

    Ok(Json(json!({
        "chats": chats,
        "messages": messages,
        "preferences": preferences,
        "exported_at": chrono::Utc::now(),
    })))
}
