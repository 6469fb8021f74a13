use async_trait::async_trait;
use sqlx::PgPool;

use super::write_error;
use crate::domain::catalog::{Category, CategoryDraft, Department, DepartmentDraft, DepartmentRef};
use crate::domain::repositories::{
    CategoryRepository, DepartmentRepository, RepositoryError, RepositoryResult,
};

/// PostgreSQL implementation of DepartmentRepository
pub struct PostgresDepartmentRepository {
    pool: PgPool,
}

impl PostgresDepartmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DepartmentRepository for PostgresDepartmentRepository {
    async fn list(&self) -> RepositoryResult<Vec<Department>> {
        let rows = sqlx::query_as::<_, Department>(
            "SELECT id, name, code, description FROM departments ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Department>> {
        let row = sqlx::query_as::<_, Department>(
            "SELECT id, name, code, description FROM departments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn create(&self, draft: &DepartmentDraft) -> RepositoryResult<Department> {
        let row = sqlx::query_as::<_, Department>(
            r#"
            INSERT INTO departments (name, code, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, code, description
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.code)
        .bind(&draft.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, "Department name or code already exists"))?;

        Ok(row)
    }

    async fn update(&self, id: i64, draft: &DepartmentDraft) -> RepositoryResult<Department> {
        sqlx::query_as::<_, Department>(
            r#"
            UPDATE departments
            SET name = $2, code = $3, description = $4
            WHERE id = $1
            RETURNING id, name, code, description
            "#,
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.code)
        .bind(&draft.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, "Department name or code already exists"))?
        .ok_or_else(|| RepositoryError::NotFound(format!("Department {}", id)))
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Department {}", id)));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    department_id: Option<i64>,
    department_name: Option<String>,
    department_code: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        let department = match (r.department_id, r.department_name) {
            (Some(id), Some(name)) => Some(DepartmentRef {
                id,
                name,
                code: r.department_code,
            }),
            _ => None,
        };
        Category {
            id: r.id,
            name: r.name,
            department,
        }
    }
}

const CATEGORY_SELECT: &str = r#"
    SELECT c.id, c.name, c.department_id,
           d.name AS department_name, d.code AS department_code
    FROM categories c
    LEFT JOIN departments d ON d.id = c.department_id
"#;

/// PostgreSQL implementation of CategoryRepository
pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn list(&self) -> RepositoryResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "{} ORDER BY d.name NULLS FIRST, c.name",
            CATEGORY_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!("{} WHERE c.id = $1", CATEGORY_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Category::from))
    }

    async fn create(&self, draft: &CategoryDraft) -> RepositoryResult<Category> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO categories (name, department_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(&draft.name)
        .bind(draft.department_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, "Category already exists for this department"))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Category {}", id)))
    }

    async fn update(&self, id: i64, draft: &CategoryDraft) -> RepositoryResult<Category> {
        let result = sqlx::query("UPDATE categories SET name = $2, department_id = $3 WHERE id = $1")
            .bind(id)
            .bind(&draft.name)
            .bind(draft.department_id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, "Category already exists for this department"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Category {}", id)));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Category {}", id)))
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Category {}", id)));
        }

        Ok(())
    }
}
