use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::{ApiJson, AuthUser};
use crate::auth::password::{hash_password, validate_new_password};
use crate::domain::grievance::{ChangeLogEntry, NewChangeLog};
use crate::domain::repositories::user_repository::{
    User, UserRepository, UserStatusCounts, UserSummary, UserUpdate,
};
use crate::domain::repositories::{ChangeLogRepository, GrievanceRepository};
use crate::domain::user::{Email, Role, Username};
use crate::infrastructure::repositories::{
    PostgresChangeLogRepository, PostgresGrievanceRepository, PostgresUserRepository,
};

/// User as returned by the API; never includes the password hash
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub designation: Option<String>,
    pub department_id: Option<i64>,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.as_str().to_string(),
            email: user.email.as_str().to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            role: user.role,
            is_active: user.is_active,
            phone: user.phone.clone(),
            address: user.address.clone(),
            designation: user.designation.clone(),
            department_id: user.department_id,
            date_joined: user.date_joined,
            last_login: user.last_login,
        }
    }
}

/// Audit entry as returned by the API
#[derive(Debug, Serialize)]
pub struct ChangeLogResponse {
    pub id: i64,
    pub user: Option<UserSummary>,
    pub grievance_id: Option<i64>,
    pub action: String,
    pub before: Option<String>,
    pub after: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<ChangeLogEntry> for ChangeLogResponse {
    fn from(entry: ChangeLogEntry) -> Self {
        Self {
            id: entry.id,
            user: entry.user,
            grievance_id: entry.grievance_id,
            action: entry.action,
            before: entry.before,
            after: entry.after,
            timestamp: entry.timestamp,
        }
    }
}

/// Blank strings clear a nullable profile field
pub(crate) fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| {
        let v = v.trim().to_string();
        if v.is_empty() {
            None
        } else {
            Some(v)
        }
    })
}

/// Request body for admin user creation
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub designation: Option<String>,
    pub department_id: Option<i64>,
    pub is_active: Option<bool>,
}

/// Request body for admin user update; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub designation: Option<String>,
    pub department_id: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct OfficerOption {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
}

#[derive(Debug, Serialize)]
pub struct UserStatusResponse {
    #[serde(flatten)]
    pub counts: UserStatusCounts,
    pub officers: Vec<OfficerOption>,
}

/// Audited account attributes, e.g. `asha role=officer active=true`
fn account_state(user: &User) -> String {
    format!("{} role={} active={}", user.username, user.role, user.is_active)
}

async fn ensure_email_free(
    repo: &PostgresUserRepository,
    email: &Email,
    except: Option<Uuid>,
) -> Result<(), ApiError> {
    if repo.email_taken(email, except).await? {
        return Err(ApiError::bad_request("A user with that email already exists."));
    }
    Ok(())
}

/// Best effort; a failed audit write must not undo the user change
async fn audit(pool: &PgPool, entry: NewChangeLog) {
    let repo = PostgresChangeLogRepository::new(pool.clone());
    if let Err(e) = repo.record(&entry).await {
        tracing::warn!(error = %e, action = %entry.action, "failed to record change log");
    }
}

/// List all users, newest first
///
/// GET /api/admin/users
pub async fn list_users(
    user: AuthUser,
    State(pool): State<PgPool>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    user.require_admin()?;

    let users = PostgresUserRepository::new(pool).list().await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// Create a user with any role
///
/// POST /api/admin/users
pub async fn create_user(
    user: AuthUser,
    State(pool): State<PgPool>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    user.require_admin()?;

    let username = Username::new(req.username).map_err(ApiError::bad_request)?;
    let email = Email::new(req.email).map_err(ApiError::bad_request)?;
    validate_new_password(&req.password, None).map_err(ApiError::bad_request)?;

    let repo = PostgresUserRepository::new(pool.clone());
    ensure_email_free(&repo, &email, None).await?;

    let password_hash = hash_password(&req.password)
        .map_err(|e| ApiError::internal_server_error(format!("Failed to hash password: {}", e)))?;

    let mut new_user = User::new(username, email, password_hash, req.role);
    new_user.first_name = req.first_name.unwrap_or_default().trim().to_string();
    new_user.last_name = req.last_name.unwrap_or_default().trim().to_string();
    new_user.phone = clearable(req.phone).flatten();
    new_user.address = clearable(req.address).flatten();
    new_user.designation = clearable(req.designation).flatten();
    new_user.department_id = req.department_id;
    new_user.is_active = req.is_active.unwrap_or(true);

    let id = repo.create(new_user.clone()).await?;
    tracing::info!(user_id = %id, role = %new_user.role, "user created by admin");

    audit(
        &pool,
        NewChangeLog::for_user_admin(
            user.id,
            "user_created",
            None,
            Some(format!("{} ({})", new_user.username, new_user.role)),
        ),
    )
    .await;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&new_user))))
}

/// GET /api/admin/users/:id
pub async fn get_user(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    user.require_admin()?;

    let found = PostgresUserRepository::new(pool)
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserResponse::from(&found)))
}

/// Partially update any user, including role and activation
///
/// PATCH /api/admin/users/:id
pub async fn update_user(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    user.require_admin()?;

    let repo = PostgresUserRepository::new(pool.clone());
    let existing = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let mut update = UserUpdate {
        first_name: req.first_name.map(|v| v.trim().to_string()),
        last_name: req.last_name.map(|v| v.trim().to_string()),
        role: req.role,
        is_active: req.is_active,
        phone: clearable(req.phone),
        address: clearable(req.address),
        designation: clearable(req.designation),
        department_id: req.department_id.map(Some),
        ..Default::default()
    };

    if let Some(username) = req.username {
        update.username = Some(Username::new(username).map_err(ApiError::bad_request)?);
    }
    if let Some(email) = req.email {
        let email = Email::new(email).map_err(ApiError::bad_request)?;
        ensure_email_free(&repo, &email, Some(id)).await?;
        update.email = Some(email);
    }
    if let Some(password) = req.password {
        validate_new_password(&password, None).map_err(ApiError::bad_request)?;
        update.password_hash = Some(hash_password(&password).map_err(|e| {
            ApiError::internal_server_error(format!("Failed to hash password: {}", e))
        })?);
    }

    if update.is_empty() {
        return Ok(Json(UserResponse::from(&existing)));
    }

    let demoted =
        existing.role == Role::Officer && matches!(update.role, Some(role) if role != Role::Officer);
    if demoted {
        let open = PostgresGrievanceRepository::new(pool.clone())
            .count_open_assigned(id)
            .await?;
        if open > 0 {
            return Err(ApiError::bad_request(format!(
                "Officer has {} open assigned grievance(s); reassign them before changing the role.",
                open
            )));
        }
    }

    let updated = repo.update(id, &update).await?;

    let (before, after) = (account_state(&existing), account_state(&updated));
    if before != after {
        audit(
            &pool,
            NewChangeLog::for_user_admin(user.id, "user_updated", Some(before), Some(after)),
        )
        .await;
    }

    Ok(Json(UserResponse::from(&updated)))
}

/// Delete a user; admins cannot delete themselves
///
/// DELETE /api/admin/users/:id
pub async fn delete_user(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    user.require_admin()?;

    if id == user.id {
        return Err(ApiError::forbidden("You cannot delete your own account."));
    }

    let repo = PostgresUserRepository::new(pool.clone());
    let existing = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    repo.delete(id).await?;
    tracing::info!(user_id = %id, "user deleted by admin");

    audit(
        &pool,
        NewChangeLog::for_user_admin(
            user.id,
            "user_deleted",
            Some(format!("{} ({})", existing.username, existing.role)),
            None,
        ),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Counts by role and activity plus the officers available for assignment
///
/// GET /api/admin/user-status
pub async fn user_status(
    user: AuthUser,
    State(pool): State<PgPool>,
) -> Result<Json<UserStatusResponse>, ApiError> {
    user.require_admin()?;

    let repo = PostgresUserRepository::new(pool);
    let counts = repo.status_counts().await?;
    let officers = repo
        .list_by_role(Role::Officer)
        .await?
        .into_iter()
        .filter(|u| u.is_active)
        .map(|u| OfficerOption {
            id: u.id,
            full_name: u.full_name(),
            username: u.username.as_str().to_string(),
        })
        .collect();

    Ok(Json(UserStatusResponse { counts, officers }))
}

/// Most recent audit entries across the portal
///
/// GET /api/admin/change-logs?limit=50
pub async fn recent_change_logs(
    user: AuthUser,
    State(pool): State<PgPool>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<ChangeLogResponse>>, ApiError> {
    user.require_admin()?;

    let limit = params
        .get("limit")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|l| *l > 0)
        .unwrap_or(50)
        .min(500);

    let entries = PostgresChangeLogRepository::new(pool).recent(limit).await?;
    Ok(Json(entries.into_iter().map(ChangeLogResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clearable_blank_means_clear() {
        assert_eq!(clearable(None), None);
        assert_eq!(clearable(Some("  ".to_string())), Some(None));
        assert_eq!(
            clearable(Some(" 9876543210 ".to_string())),
            Some(Some("9876543210".to_string()))
        );
    }

    #[test]
    fn account_state_renders_role_and_activity() {
        let mut user = User::new(
            Username::new("asha").unwrap(),
            Email::new("asha@example.com").unwrap(),
            "hash".to_string(),
            Role::Citizen,
        );
        assert_eq!(account_state(&user), "asha role=citizen active=true");
        user.is_active = false;
        assert_eq!(account_state(&user), "asha role=citizen active=false");
    }

    #[test]
    fn user_response_hides_password_hash() {
        let user = User::new(
            Username::new("officer1").unwrap(),
            Email::new("officer1@example.com").unwrap(),
            "$2b$12$secret".to_string(),
            Role::Officer,
        );
        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();
        assert_eq!(json["role"], "officer");
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("secret"));
    }
}
