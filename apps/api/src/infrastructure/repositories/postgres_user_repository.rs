use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::write_error;
use crate::domain::repositories::user_repository::{
    User, UserRepository, UserStatusCounts, UserSummary, UserUpdate,
};
use crate::domain::repositories::{RepositoryError, RepositoryResult};
use crate::domain::user::value_objects::{Email, Role, Username};

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, password_hash, role, \
     is_active, phone, address, designation, department_id, date_joined, last_login";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    role: Role,
    is_active: bool,
    phone: Option<String>,
    address: Option<String>,
    designation: Option<String>,
    department_id: Option<i64>,
    date_joined: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: r.id,
            username: Username::new(r.username).map_err(RepositoryError::Corrupt)?,
            email: Email::new(r.email).map_err(RepositoryError::Corrupt)?,
            first_name: r.first_name,
            last_name: r.last_name,
            password_hash: r.password_hash,
            role: r.role,
            is_active: r.is_active,
            phone: r.phone,
            address: r.address,
            designation: r.designation,
            department_id: r.department_id,
            date_joined: r.date_joined,
            last_login: r.last_login,
        })
    }
}

fn into_users(rows: Vec<UserRow>) -> RepositoryResult<Vec<User>> {
    rows.into_iter().map(User::try_from).collect()
}

/// PostgreSQL implementation of UserRepository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a new PostgresUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> RepositoryResult<Uuid> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, first_name, last_name, password_hash, role,
                is_active, phone, address, designation, department_id, date_joined
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(user.id)
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.is_active)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(&user.designation)
        .bind(user.department_id)
        .bind(user.date_joined)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "Username or email already registered"))?;

        Ok(user.id)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_login(&self, login: &str) -> RepositoryResult<Option<User>> {
        let login = login.trim();

        // Usernames may contain '@', so a missed email lookup falls through
        if login.contains('@') {
            let row = sqlx::query_as::<_, UserRow>(&format!(
                "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
                USER_COLUMNS
            ))
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(row) = row {
                return User::try_from(row).map(Some);
            }
        }

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn email_taken(&self, email: &Email, except: Option<Uuid>) -> RepositoryResult<bool> {
        let (taken,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE LOWER(email) = LOWER($1)
                  AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email.as_str())
        .bind(except)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn list(&self) -> RepositoryResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users ORDER BY date_joined DESC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        into_users(rows)
    }

    async fn list_by_role(&self, role: Role) -> RepositoryResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE role = $1 ORDER BY username",
            USER_COLUMNS
        ))
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        into_users(rows)
    }

    async fn update(&self, id: Uuid, update: &UserUpdate) -> RepositoryResult<User> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET updated_at = NOW()");

        if let Some(username) = &update.username {
            qb.push(", username = ").push_bind(username.as_str().to_string());
        }
        if let Some(email) = &update.email {
            qb.push(", email = ").push_bind(email.as_str().to_string());
        }
        if let Some(first_name) = &update.first_name {
            qb.push(", first_name = ").push_bind(first_name.clone());
        }
        if let Some(last_name) = &update.last_name {
            qb.push(", last_name = ").push_bind(last_name.clone());
        }
        if let Some(password_hash) = &update.password_hash {
            qb.push(", password_hash = ").push_bind(password_hash.clone());
        }
        if let Some(role) = update.role {
            qb.push(", role = ").push_bind(role);
        }
        if let Some(is_active) = update.is_active {
            qb.push(", is_active = ").push_bind(is_active);
        }
        if let Some(phone) = &update.phone {
            qb.push(", phone = ").push_bind(phone.clone());
        }
        if let Some(address) = &update.address {
            qb.push(", address = ").push_bind(address.clone());
        }
        if let Some(designation) = &update.designation {
            qb.push(", designation = ").push_bind(designation.clone());
        }
        if let Some(department_id) = update.department_id {
            qb.push(", department_id = ").push_bind(department_id);
        }

        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" RETURNING ").push(USER_COLUMNS);

        let row = qb
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| write_error(e, "Username or email already registered"))?
            .ok_or_else(|| RepositoryError::NotFound(format!("User {}", id)))?;

        User::try_from(row)
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("User {}", id)));
        }

        Ok(())
    }

    async fn update_last_login(&self, user_id: Uuid) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET last_login = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn status_counts(&self) -> RepositoryResult<UserStatusCounts> {
        let counts = sqlx::query_as::<_, UserStatusCounts>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE role = 'citizen') AS citizens,
                COUNT(*) FILTER (WHERE role = 'officer') AS officers,
                COUNT(*) FILTER (WHERE role = 'admin') AS admins,
                COUNT(*) FILTER (WHERE is_active) AS active,
                COUNT(*) FILTER (WHERE NOT is_active) AS inactive
            FROM users
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }
}

/// Builds a summary from LEFT JOINed user columns; None when the join missed
pub(crate) fn joined_summary(
    id: Option<Uuid>,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
) -> Option<UserSummary> {
    match (id, username) {
        (Some(id), Some(username)) => Some(UserSummary {
            id,
            username,
            first_name: first_name.unwrap_or_default(),
            last_name: last_name.unwrap_or_default(),
            email: email.unwrap_or_default(),
        }),
        _ => None,
    }
}
