//! Axum route handlers for the Projects API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::Claims;
use crate::errors::AppError;
use crate::models::project::{ProjectFileRow, ProjectRow};
use crate::projects::generator::generate_project;
use crate::projects::payload::GeneratedFile;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateProjectRequest {
    pub project_type: String,
    #[serde(default)]
    pub description: String,
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateProjectResponse {
    pub project: ProjectRow,
    pub files: Vec<GeneratedFile>,
    pub explanation: Option<String>,
}

/// POST /api/v1/projects/generate
///
/// The generation function: creates the project row, asks the model for a
/// file payload, persists the files, and returns the ready project.
pub async fn handle_generate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<GenerateProjectRequest>,
) -> Result<Json<GenerateProjectResponse>, AppError> {
    let response = generate_project(&state, claims.sub, req).await?;
    Ok(Json(response))
}

/// GET /api/v1/projects
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ProjectRow>>, AppError> {
    let projects: Vec<ProjectRow> =
        sqlx::query_as("SELECT * FROM projects WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(claims.sub)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(projects))
}

/// GET /api/v1/projects/:id
///
/// Read-through: serves from the in-memory cache when the row has already
/// been fetched this process lifetime.
pub async fn get_project(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ProjectRow>, AppError> {
    if let Some(cached) = state.project_cache.get(project_id) {
        if cached.user_id == claims.sub {
            return Ok(Json(cached));
        }
    }

    let project: Option<ProjectRow> =
        sqlx::query_as("SELECT * FROM projects WHERE id = $1 AND user_id = $2")
            .bind(project_id)
            .bind(claims.sub)
            .fetch_optional(&state.db)
            .await?;

    let project =
        project.ok_or_else(|| AppError::NotFound(format!("Project {project_id} not found")))?;
    state.project_cache.insert(project.clone());

    Ok(Json(project))
}

/// GET /api/v1/projects/:id/files
pub async fn list_project_files(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<ProjectFileRow>>, AppError> {
    let owned: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM projects WHERE id = $1 AND user_id = $2")
            .bind(project_id)
            .bind(claims.sub)
            .fetch_optional(&state.db)
            .await?;
    if owned.is_none() {
        return Err(AppError::NotFound(format!("Project {project_id} not found")));
    }

    let files: Vec<ProjectFileRow> = sqlx::query_as(
        "SELECT * FROM project_files WHERE project_id = $1 ORDER BY file_path ASC",
    )
    .bind(project_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(files))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub github_repo: Option<String>,
    pub publish_url: Option<String>,
}

/// PATCH /api/v1/projects/:id
pub async fn update_project(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectRow>, AppError> {
    let project: Option<ProjectRow> = sqlx::query_as(
        r#"
        UPDATE projects
        SET title = COALESCE($1, title),
            description = COALESCE($2, description),
            github_repo = COALESCE($3, github_repo),
            publish_url = COALESCE($4, publish_url),
            updated_at = now()
        WHERE id = $5 AND user_id = $6
        RETURNING *
        "#,
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.github_repo)
    .bind(&req.publish_url)
    .bind(project_id)
    .bind(claims.sub)
    .fetch_optional(&state.db)
    .await?;

    let project =
        project.ok_or_else(|| AppError::NotFound(format!("Project {project_id} not found")))?;
    state.project_cache.insert(project.clone());

    Ok(Json(project))
}

/// DELETE /api/v1/projects/:id
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(project_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
        .bind(project_id)
        .bind(claims.sub)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Project {project_id} not found")));
    }
    state.project_cache.remove(project_id);

    Ok(StatusCode::NO_CONTENT)
}
