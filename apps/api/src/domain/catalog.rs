// Department and category reference data
// Administrators maintain these; grievances point at them

use serde::Serialize;

/// Government department handling grievances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
}

/// Validated department fields for insert or full update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentDraft {
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
}

impl DepartmentDraft {
    /// # Business Rules Enforced
    /// - Name must not be blank, at most 150 characters
    /// - Code is at most 50 characters; blank codes become None
    pub fn new(
        name: &str,
        code: Option<&str>,
        description: Option<&str>,
    ) -> Result<Self, String> {
        let name = name.trim();
        if name.is_empty() {
            return Err("Department name cannot be empty".to_string());
        }
        if name.chars().count() > 150 {
            return Err("Department name must be at most 150 characters".to_string());
        }

        let code = code.map(str::trim).filter(|c| !c.is_empty());
        if code.is_some_and(|c| c.chars().count() > 50) {
            return Err("Department code must be at most 50 characters".to_string());
        }

        Ok(Self {
            name: name.to_string(),
            code: code.map(str::to_string),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        })
    }
}

/// Grievance category, optionally owned by a department
///
/// `(name, department)` is unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub department: Option<DepartmentRef>,
}

/// Department as embedded in a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentRef {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
}

/// Validated category fields for insert or full update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
    pub department_id: Option<i64>,
}

impl CategoryDraft {
    pub fn new(name: &str, department_id: Option<i64>) -> Result<Self, String> {
        let name = name.trim();
        if name.is_empty() {
            return Err("Category name cannot be empty".to_string());
        }
        if name.chars().count() > 150 {
            return Err("Category name must be at most 150 characters".to_string());
        }
        Ok(Self {
            name: name.to_string(),
            department_id,
        })
    }
}
