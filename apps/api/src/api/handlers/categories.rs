use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::nullable;
use crate::api::errors::ApiError;
use crate::api::middleware::{ApiJson, AuthUser};
use crate::domain::catalog::{Category, CategoryDraft, DepartmentRef};
use crate::domain::repositories::CategoryRepository;
use crate::infrastructure::repositories::PostgresCategoryRepository;

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub department_id: Option<i64>,
    pub department: Option<DepartmentRef>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            department_id: category.department.as_ref().map(|d| d.id),
            department: category.department,
        }
    }
}

/// Body for create, replace and partial update
///
/// On PATCH, an explicit `"department_id": null` detaches the category.
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub department_id: Option<Option<i64>>,
}

impl CategoryRequest {
    fn into_draft(self) -> Result<CategoryDraft, ApiError> {
        let name = self
            .name
            .ok_or_else(|| ApiError::bad_request("name is required"))?;
        CategoryDraft::new(&name, self.department_id.flatten()).map_err(ApiError::bad_request)
    }

    fn merge_into(self, current: &Category) -> Result<CategoryDraft, ApiError> {
        let department_id = match self.department_id {
            Some(department_id) => department_id,
            None => current.department.as_ref().map(|d| d.id),
        };
        CategoryDraft::new(self.name.as_deref().unwrap_or(&current.name), department_id)
            .map_err(ApiError::bad_request)
    }
}

/// GET /api/categories
pub async fn list_categories(
    _user: AuthUser,
    State(pool): State<PgPool>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = PostgresCategoryRepository::new(pool).list().await?;
    Ok(Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

/// POST /api/categories
pub async fn create_category(
    user: AuthUser,
    State(pool): State<PgPool>,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    user.require_admin()?;

    let draft = req.into_draft()?;
    let category = PostgresCategoryRepository::new(pool).create(&draft).await?;
    tracing::info!(category_id = category.id, "category created");

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

/// GET /api/categories/:id
pub async fn get_category(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<Json<CategoryResponse>, ApiError> {
    user.require_admin()?;

    PostgresCategoryRepository::new(pool)
        .find_by_id(id)
        .await?
        .map(|c| Json(CategoryResponse::from(c)))
        .ok_or_else(|| ApiError::not_found("Category not found"))
}

/// PUT /api/categories/:id
pub async fn replace_category(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    user.require_admin()?;

    let draft = req.into_draft()?;
    let category = PostgresCategoryRepository::new(pool)
        .update(id, &draft)
        .await?;
    Ok(Json(CategoryResponse::from(category)))
}

/// PATCH /api/categories/:id
pub async fn update_category(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    user.require_admin()?;

    let repo = PostgresCategoryRepository::new(pool);
    let current = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    let draft = req.merge_into(&current)?;
    Ok(Json(CategoryResponse::from(repo.update(id, &draft).await?)))
}

/// DELETE /api/categories/:id
pub async fn delete_category(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    user.require_admin()?;

    PostgresCategoryRepository::new(pool).delete(id).await?;
    tracing::info!(category_id = id, "category deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current() -> Category {
        Category {
            id: 4,
            name: "Potholes".to_string(),
            department: Some(DepartmentRef {
                id: 2,
                name: "Public Works".to_string(),
                code: None,
            }),
        }
    }

    #[test]
    fn absent_and_null_department_differ() {
        let absent: CategoryRequest = serde_json::from_str(r#"{"name": "Drainage"}"#).unwrap();
        assert_eq!(absent.department_id, None);
        assert_eq!(absent.merge_into(&current()).unwrap().department_id, Some(2));

        let null: CategoryRequest =
            serde_json::from_str(r#"{"name": "Drainage", "department_id": null}"#).unwrap();
        assert_eq!(null.department_id, Some(None));
        assert_eq!(null.merge_into(&current()).unwrap().department_id, None);
    }

    #[test]
    fn response_nests_department() {
        let json = serde_json::to_value(CategoryResponse::from(current())).unwrap();
        assert_eq!(json["department_id"], 2);
        assert_eq!(json["department"]["name"], "Public Works");
    }
}
