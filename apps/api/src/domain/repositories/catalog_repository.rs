use async_trait::async_trait;

use super::RepositoryResult;
use crate::domain::catalog::{Category, CategoryDraft, Department, DepartmentDraft};

/// Repository trait for departments
#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    /// All departments ordered by name
    async fn list(&self) -> RepositoryResult<Vec<Department>>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Department>>;

    /// Duplicate name or code is a conflict
    async fn create(&self, draft: &DepartmentDraft) -> RepositoryResult<Department>;

    async fn update(&self, id: i64, draft: &DepartmentDraft) -> RepositoryResult<Department>;

    /// Categories, grievances and officers of the department keep a NULL reference
    async fn delete(&self, id: i64) -> RepositoryResult<()>;
}

/// Repository trait for grievance categories
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// All categories ordered by department name, then name
    async fn list(&self) -> RepositoryResult<Vec<Category>>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Category>>;

    /// Duplicate `(name, department)` or unknown department is a conflict
    async fn create(&self, draft: &CategoryDraft) -> RepositoryResult<Category>;

    async fn update(&self, id: i64, draft: &CategoryDraft) -> RepositoryResult<Category>;

    /// Grievances in the category keep a NULL reference
    async fn delete(&self, id: i64) -> RepositoryResult<()>;
}
