use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Project lifecycle. Rows are created `generating`; the generation pipeline
/// flips them to `ready` on success or `error` via the compensating update.
pub const STATUS_GENERATING: &str = "generating";
pub const STATUS_READY: &str = "ready";
pub const STATUS_ERROR: &str = "error";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub project_type: String,
    pub status: String,
    pub model: String,
    pub github_repo: Option<String>,
    pub publish_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectFileRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub file_path: String,
    pub file_content: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
}
