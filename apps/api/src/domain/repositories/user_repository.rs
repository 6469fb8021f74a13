use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::RepositoryResult;
use crate::domain::user::value_objects::{Email, Role, Username};

/// User data for persistence
///
/// Profile fields are shared by all roles: `phone`/`address` are what
/// citizens fill in, `designation`/`department_id` describe officers.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: Username,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub designation: Option<String>,
    pub department_id: Option<i64>,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// A fresh, active account with empty profile fields
    pub fn new(
        username: Username,
        email: Email,
        password_hash: String,
        role: Role,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            first_name: String::new(),
            last_name: String::new(),
            password_hash,
            role,
            is_active: true,
            phone: None,
            address: None,
            designation: None,
            department_id: None,
            date_joined: Utc::now(),
            last_login: None,
        }
    }

    pub fn full_name(&self) -> String {
        full_name(&self.first_name, &self.last_name)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.as_str().to_string(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.as_str().to_string(),
        }
    }
}

/// Compact user reference embedded in grievances, remarks and logs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl UserSummary {
    pub fn full_name(&self) -> String {
        full_name(&self.first_name, &self.last_name)
    }
}

fn full_name(first: &str, last: &str) -> String {
    format!("{} {}", first, last).trim().to_string()
}

/// Partial update; `None` leaves the column untouched
///
/// Nullable profile columns use `Option<Option<_>>` so that a value can be
/// cleared.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<Username>,
    pub email: Option<Email>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub phone: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub designation: Option<Option<String>>,
    pub department_id: Option<Option<i64>>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.designation.is_none()
            && self.department_id.is_none()
    }
}

/// Account counts for the admin user-status view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct UserStatusCounts {
    pub total: i64,
    pub citizens: i64,
    pub officers: i64,
    pub admins: i64,
    pub active: i64,
    pub inactive: i64,
}

/// Repository trait for User aggregate
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user; duplicate username or email is a conflict
    async fn create(&self, user: User) -> RepositoryResult<Uuid>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>>;

    /// Find a user by username, or by email (case-insensitive) when the login
    /// contains '@'
    async fn find_by_login(&self, login: &str) -> RepositoryResult<Option<User>>;

    /// True when another account already uses this email (case-insensitive)
    async fn email_taken(&self, email: &Email, except: Option<Uuid>) -> RepositoryResult<bool>;

    /// All users, newest first
    async fn list(&self) -> RepositoryResult<Vec<User>>;

    /// Users with the given role, ordered by username
    async fn list_by_role(&self, role: Role) -> RepositoryResult<Vec<User>>;

    /// Apply a partial update and return the stored user
    async fn update(&self, id: Uuid, update: &UserUpdate) -> RepositoryResult<User>;

    /// Delete a user; their grievances and remarks keep a NULL reference
    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;

    /// Update user's last login timestamp
    async fn update_last_login(&self, user_id: Uuid) -> RepositoryResult<()>;

    /// Counts by role and activity
    async fn status_counts(&self) -> RepositoryResult<UserStatusCounts>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            Username::new("lakshmi").unwrap(),
            Email::new("lakshmi@example.com").unwrap(),
            "hash".to_string(),
            Role::Citizen,
        )
    }

    #[test]
    fn new_user_is_active_without_login() {
        let user = user();
        assert!(user.is_active);
        assert!(user.last_login.is_none());
        assert_eq!(user.role, Role::Citizen);
    }

    #[test]
    fn full_name_trims_missing_parts() {
        let mut user = user();
        assert_eq!(user.full_name(), "");

        user.first_name = "Lakshmi".to_string();
        assert_eq!(user.full_name(), "Lakshmi");

        user.last_name = "Nair".to_string();
        assert_eq!(user.full_name(), "Lakshmi Nair");
        assert_eq!(user.summary().full_name(), "Lakshmi Nair");
    }

    #[test]
    fn empty_update() {
        assert!(UserUpdate::default().is_empty());
        let update = UserUpdate {
            phone: Some(None),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
