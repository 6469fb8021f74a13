use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::PgPool;

use crate::api::errors::ApiError;
use crate::api::middleware::{ApiJson, AuthUser};
use crate::domain::catalog::{Department, DepartmentDraft};
use crate::domain::repositories::DepartmentRepository;
use crate::infrastructure::repositories::PostgresDepartmentRepository;

/// Body for create, replace and partial update
#[derive(Debug, Deserialize)]
pub struct DepartmentRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
}

impl DepartmentRequest {
    /// Full representation; a missing name is rejected
    fn into_draft(self) -> Result<DepartmentDraft, ApiError> {
        let name = self
            .name
            .ok_or_else(|| ApiError::bad_request("name is required"))?;
        DepartmentDraft::new(&name, self.code.as_deref(), self.description.as_deref())
            .map_err(ApiError::bad_request)
    }

    /// Missing fields keep their current value
    fn merge_into(self, current: &Department) -> Result<DepartmentDraft, ApiError> {
        DepartmentDraft::new(
            self.name.as_deref().unwrap_or(&current.name),
            self.code.as_deref().or(current.code.as_deref()),
            self.description
                .as_deref()
                .or(current.description.as_deref()),
        )
        .map_err(ApiError::bad_request)
    }
}

/// GET /api/departments
pub async fn list_departments(
    _user: AuthUser,
    State(pool): State<PgPool>,
) -> Result<Json<Vec<Department>>, ApiError> {
    let departments = PostgresDepartmentRepository::new(pool).list().await?;
    Ok(Json(departments))
}

/// POST /api/departments
pub async fn create_department(
    user: AuthUser,
    State(pool): State<PgPool>,
    ApiJson(req): ApiJson<DepartmentRequest>,
) -> Result<(StatusCode, Json<Department>), ApiError> {
    user.require_admin()?;

    let draft = req.into_draft()?;
    let department = PostgresDepartmentRepository::new(pool).create(&draft).await?;
    tracing::info!(department_id = department.id, "department created");

    Ok((StatusCode::CREATED, Json(department)))
}

/// GET /api/departments/:id
pub async fn get_department(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<Json<Department>, ApiError> {
    user.require_admin()?;

    PostgresDepartmentRepository::new(pool)
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Department not found"))
}

/// PUT /api/departments/:id
pub async fn replace_department(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<DepartmentRequest>,
) -> Result<Json<Department>, ApiError> {
    user.require_admin()?;

    let draft = req.into_draft()?;
    let department = PostgresDepartmentRepository::new(pool)
        .update(id, &draft)
        .await?;
    Ok(Json(department))
}

/// PATCH /api/departments/:id
pub async fn update_department(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<DepartmentRequest>,
) -> Result<Json<Department>, ApiError> {
    user.require_admin()?;

    let repo = PostgresDepartmentRepository::new(pool);
    let current = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Department not found"))?;

    let draft = req.merge_into(&current)?;
    Ok(Json(repo.update(id, &draft).await?))
}

/// Categories and grievances keep a NULL department afterwards
///
/// DELETE /api/departments/:id
pub async fn delete_department(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    user.require_admin()?;

    PostgresDepartmentRepository::new(pool).delete(id).await?;
    tracing::info!(department_id = id, "department deleted");

    Ok(StatusCode::NO_CONTENT)
}
