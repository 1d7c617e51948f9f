use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Flat per-user preference row. One row per user, created lazily with
/// database defaults on first read.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserPreferencesRow {
    pub id: Uuid,
    pub user_id: Uuid,

    // Personalization
    pub base_style_tone: String,
    pub custom_instructions: Option<String>,
    pub about_you_nickname: Option<String>,
    pub about_you_occupation: Option<String>,
    pub about_you_more: Option<String>,
    pub reference_saved_memories: bool,
    pub reference_chat_history: bool,

    // General
    pub appearance: String,
    pub accent_color: String,
    pub language: String,
    pub spoken_language: String,
    pub voice: String,

    // Advanced
    pub web_search: bool,
    pub code_interpreter: bool,
    pub canvas: bool,
    pub voice_mode: bool,

    // Notifications
    pub notif_responses: String,
    pub notif_tasks: String,
    pub notif_projects: String,

    // Data controls
    pub improve_model: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FamilyMemberRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_name: String,
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub billing_cycle: Option<String>,
    pub renewal_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
