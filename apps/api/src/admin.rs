//! Admin dashboard surface: admin roster, roles, permissions, assignments.
//! Every route here sits behind the `require_admin` middleware.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::Claims;
use crate::errors::AppError;
use crate::models::admin::{AdminUserRow, PermissionRow, RoleRow, UserRoleRow};
use crate::state::AppState;

/// GET /api/v1/admin/users
pub async fn list_admin_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminUserRow>>, AppError> {
    let admins: Vec<AdminUserRow> =
        sqlx::query_as("SELECT * FROM admin_users ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?;

    Ok(Json(admins))
}

#[derive(Debug, Deserialize)]
pub struct AddAdminRequest {
    pub email: String,
}

/// POST /api/v1/admin/users
///
/// Resolves the target account by email before granting admin.
pub async fn add_admin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddAdminRequest>,
) -> Result<(StatusCode, Json<AdminUserRow>), AppError> {
    let user: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM user_profiles WHERE email = $1")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?;
    let (user_id,) = user.ok_or_else(|| {
        AppError::NotFound("User not found with this email".to_string())
    })?;

    let admin: AdminUserRow = sqlx::query_as(
        r#"
        INSERT INTO admin_users (id, user_id, email, created_by)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&req.email)
    .bind(claims.sub)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(admin)))
}

/// DELETE /api/v1/admin/users/:id
pub async fn remove_admin(
    State(state): State<AppState>,
    Path(admin_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM admin_users WHERE id = $1")
        .bind(admin_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Admin {admin_id} not found")));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/roles
pub async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<RoleRow>>, AppError> {
    let roles: Vec<RoleRow> = sqlx::query_as("SELECT * FROM roles ORDER BY name")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(roles))
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: String,
}

/// POST /api/v1/admin/roles
pub async fn create_role(
    State(state): State<AppState>,
    Json(req): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<RoleRow>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }

    let role: RoleRow = sqlx::query_as(
        "INSERT INTO roles (id, name, description) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(req.name.trim())
    .bind(&req.description)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(role)))
}

/// DELETE /api/v1/admin/roles/:id
pub async fn delete_role(
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM roles WHERE id = $1")
        .bind(role_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Role {role_id} not found")));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// A user-role assignment joined with its role for the dashboard list.
#[derive(Debug, Serialize)]
pub struct UserRoleWithRole {
    #[serde(flatten)]
    pub assignment: UserRoleRow,
    pub role: Option<RoleRow>,
}

/// GET /api/v1/admin/users/:id/roles
pub async fn list_user_roles(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<UserRoleWithRole>>, AppError> {
    let assignments: Vec<UserRoleRow> =
        sqlx::query_as("SELECT * FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&state.db)
            .await?;

    let mut result = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let role: Option<RoleRow> = sqlx::query_as("SELECT * FROM roles WHERE id = $1")
            .bind(assignment.role_id)
            .fetch_optional(&state.db)
            .await?;
        result.push(UserRoleWithRole { assignment, role });
    }

    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub user_id: Uuid,
    pub role_id: Uuid,
}

/// POST /api/v1/admin/user-roles
pub async fn assign_role(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AssignRoleRequest>,
) -> Result<(StatusCode, Json<UserRoleRow>), AppError> {
    let assignment: UserRoleRow = sqlx::query_as(
        r#"
        INSERT INTO user_roles (id, user_id, role_id, assigned_by)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.user_id)
    .bind(req.role_id)
    .bind(claims.sub)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

/// DELETE /api/v1/admin/user-roles/:id
pub async fn remove_user_role(
    State(state): State<AppState>,
    Path(user_role_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM user_roles WHERE id = $1")
        .bind(user_role_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Role assignment {user_role_id} not found"
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/permissions
pub async fn list_permissions(
    State(state): State<AppState>,
) -> Result<Json<Vec<PermissionRow>>, AppError> {
    let permissions: Vec<PermissionRow> =
        sqlx::query_as("SELECT * FROM permissions ORDER BY name")
            .fetch_all(&state.db)
            .await?;

    Ok(Json(permissions))
}

/// GET /api/v1/admin/roles/:id/permissions
pub async fn list_role_permissions(
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
) -> Result<Json<Vec<PermissionRow>>, AppError> {
    let permissions: Vec<PermissionRow> = sqlx::query_as(
        r#"
        SELECT p.* FROM permissions p
        JOIN role_permissions rp ON rp.permission_id = p.id
        WHERE rp.role_id = $1
        ORDER BY p.name
        "#,
    )
    .bind(role_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(permissions))
}

#[derive(Debug, Deserialize)]
pub struct RolePermissionRequest {
    pub permission_id: Uuid,
}

/// POST /api/v1/admin/roles/:id/permissions
pub async fn assign_permission(
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
    Json(req): Json<RolePermissionRequest>,
) -> Result<StatusCode, AppError> {
    sqlx::query(
        "INSERT INTO role_permissions (id, role_id, permission_id) VALUES ($1, $2, $3)",
    )
    .bind(Uuid::new_v4())
    .bind(role_id)
    .bind(req.permission_id)
    .execute(&state.db)
    .await?;

    Ok(StatusCode::CREATED)
}

/// DELETE /api/v1/admin/roles/:id/permissions/:permission_id
pub async fn remove_permission(
    State(state): State<AppState>,
    Path((role_id, permission_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let result =
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = $2")
            .bind(role_id)
            .bind(permission_id)
            .execute(&state.db)
            .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Permission assignment not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
