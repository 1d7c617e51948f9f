//! Project generation — orchestrates the scaffolding pipeline.
//!
//! Flow: insert project row (`generating`) → prompt the completion endpoint
//! → parse-or-fallback the payload → insert file rows → flip the project to
//! `ready` with the explanation as its description.
//!
//! Any failure after the project row exists triggers a compensating
//! `status = 'error'` update before the error response, so no project is
//! left in `generating` forever.

use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::{ChatMessage, CompletionOptions, CHAT_MODEL};
use crate::models::project::{ProjectRow, STATUS_ERROR, STATUS_GENERATING, STATUS_READY};
use crate::projects::handlers::{GenerateProjectRequest, GenerateProjectResponse};
use crate::projects::payload::parse_payload;
use crate::projects::prompts::{build_system_prompt, build_user_prompt};
use crate::state::AppState;

/// Model id recorded on the project card.
pub const PROJECT_MODEL: &str = "sonnet-4.5";

const GENERATION_TEMPERATURE: f32 = 0.7;
const GENERATION_MAX_TOKENS: u32 = 8000;

pub async fn generate_project(
    state: &AppState,
    user_id: Uuid,
    req: GenerateProjectRequest,
) -> Result<GenerateProjectResponse, AppError> {
    let project_type = req.project_type.trim().to_string();
    if project_type.is_empty() {
        return Err(AppError::Validation(
            "projectType cannot be empty".to_string(),
        ));
    }

    let title = req
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{project_type} Project"));
    let description = {
        let d = req.description.trim();
        if d.is_empty() {
            format!("A new {project_type} project")
        } else {
            d.to_string()
        }
    };

    let project: ProjectRow = sqlx::query_as(
        r#"
        INSERT INTO projects (id, user_id, title, description, project_type, status, model)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&title)
    .bind(&description)
    .bind(&project_type)
    .bind(STATUS_GENERATING)
    .bind(PROJECT_MODEL)
    .fetch_one(&state.db)
    .await?;

    info!("Project {} created for user {user_id}", project.id);

    match run_generation(state, &project, &description).await {
        Ok(response) => Ok(response),
        Err(e) => {
            mark_failed(&state.db, project.id).await;
            Err(e)
        }
    }
}

async fn run_generation(
    state: &AppState,
    project: &ProjectRow,
    description: &str,
) -> Result<GenerateProjectResponse, AppError> {
    let messages = [
        ChatMessage::system(build_system_prompt(&project.project_type)),
        ChatMessage::user(build_user_prompt(&project.project_type, description)),
    ];
    let options = CompletionOptions {
        temperature: Some(GENERATION_TEMPERATURE),
        max_tokens: Some(GENERATION_MAX_TOKENS),
    };

    let reply = state.llm.complete(CHAT_MODEL, &messages, options).await?;
    let payload = parse_payload(&reply);

    for file in &payload.files {
        sqlx::query(
            r#"
            INSERT INTO project_files (id, project_id, file_path, file_content, language)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(project.id)
        .bind(&file.path)
        .bind(&file.content)
        .bind(file.language.as_deref().unwrap_or("text"))
        .execute(&state.db)
        .await?;
    }

    let project: ProjectRow = sqlx::query_as(
        r#"
        UPDATE projects
        SET status = $1, description = COALESCE($2, description), updated_at = now()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(STATUS_READY)
    .bind(&payload.explanation)
    .bind(project.id)
    .fetch_one(&state.db)
    .await?;

    state.project_cache.insert(project.clone());

    info!(
        "Project generation complete: {} ({} files)",
        project.id,
        payload.files.len()
    );

    Ok(GenerateProjectResponse {
        explanation: payload.explanation.clone(),
        files: payload.files,
        project,
    })
}

/// Compensating update: flips the stuck `generating` row to `error`.
/// Best-effort — a failure here is logged, not propagated over the original
/// error.
async fn mark_failed(pool: &PgPool, project_id: Uuid) {
    let result = sqlx::query("UPDATE projects SET status = $1, updated_at = now() WHERE id = $2")
        .bind(STATUS_ERROR)
        .bind(project_id)
        .execute(pool)
        .await;

    match result {
        Ok(_) => info!("Project {project_id} marked as error after failed generation"),
        Err(e) => error!("Failed to mark project {project_id} as error: {e}"),
    }
}
