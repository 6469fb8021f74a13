use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::postgres_user_repository::joined_summary;
use crate::domain::grievance::{ChangeLogEntry, NewChangeLog};
use crate::domain::repositories::{ChangeLogRepository, RepositoryResult};

pub(crate) const CHANGE_LOG_SELECT: &str = r#"
    SELECT l.id, l.user_id, l.grievance_id, l.action, l.before_value, l.after_value,
           l.logged_at, u.username, u.first_name, u.last_name, u.email
    FROM change_logs l
    LEFT JOIN users u ON u.id = l.user_id
"#;

#[derive(sqlx::FromRow)]
pub(crate) struct ChangeLogRow {
    id: i64,
    user_id: Option<Uuid>,
    grievance_id: Option<i64>,
    action: String,
    before_value: Option<String>,
    after_value: Option<String>,
    logged_at: DateTime<Utc>,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
}

impl From<ChangeLogRow> for ChangeLogEntry {
    fn from(r: ChangeLogRow) -> Self {
        ChangeLogEntry {
            id: r.id,
            user: joined_summary(r.user_id, r.username, r.first_name, r.last_name, r.email),
            grievance_id: r.grievance_id,
            action: r.action,
            before: r.before_value,
            after: r.after_value,
            timestamp: r.logged_at,
        }
    }
}

/// Writes one audit entry on an open connection or transaction
pub(crate) async fn insert_change_log(
    conn: &mut PgConnection,
    entry: &NewChangeLog,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO change_logs (user_id, grievance_id, action, before_value, after_value)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.grievance_id)
    .bind(&entry.action)
    .bind(&entry.before)
    .bind(&entry.after)
    .execute(conn)
    .await?;

    Ok(())
}

/// PostgreSQL implementation of ChangeLogRepository
pub struct PostgresChangeLogRepository {
    pool: PgPool,
}

impl PostgresChangeLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChangeLogRepository for PostgresChangeLogRepository {
    async fn record(&self, entry: &NewChangeLog) -> RepositoryResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_change_log(&mut *conn, entry).await?;
        Ok(())
    }

    async fn recent(&self, limit: i64) -> RepositoryResult<Vec<ChangeLogEntry>> {
        let rows = sqlx::query_as::<_, ChangeLogRow>(&format!(
            "{} ORDER BY l.logged_at DESC, l.id DESC LIMIT $1",
            CHANGE_LOG_SELECT
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ChangeLogEntry::from).collect())
    }
}
