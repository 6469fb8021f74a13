use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::postgres_change_log_repository::{insert_change_log, ChangeLogRow, CHANGE_LOG_SELECT};
use super::postgres_user_repository::joined_summary;
use super::write_error;
use crate::domain::catalog::{Category, DepartmentRef};
use crate::domain::grievance::{
    CategoryFilter, ChangeLogEntry, Feedback, Grievance, GrievanceEvent, GrievanceFilter,
    GrievanceStatus, NewChangeLog, NewFeedback, NewGrievance, NewRemark, Page, Remark,
    TrackingId,
};
use crate::domain::repositories::grievance_repository::{GrievanceRepository, GrievanceView};
use crate::domain::repositories::{RepositoryError, RepositoryResult};

const GRIEVANCE_COLUMNS: &str = "id, tracking_id, user_id, title, description, category_id, \
     department_id, attachment, assigned_officer_id, status, created_at, updated_at";

const VIEW_SELECT: &str = r#"
    SELECT g.id, g.tracking_id, g.user_id, g.title, g.description, g.category_id,
           g.department_id, g.attachment, g.assigned_officer_id, g.status,
           g.created_at, g.updated_at,
           fu.username AS filer_username, fu.first_name AS filer_first_name,
           fu.last_name AS filer_last_name, fu.email AS filer_email,
           c.name AS category_name, cd.id AS category_department_id,
           cd.name AS category_department_name, cd.code AS category_department_code,
           d.name AS department_name, d.code AS department_code,
           o.username AS officer_username, o.first_name AS officer_first_name,
           o.last_name AS officer_last_name, o.email AS officer_email
"#;

const VIEW_FROM: &str = r#"
    FROM grievances g
    LEFT JOIN users fu ON fu.id = g.user_id
    LEFT JOIN categories c ON c.id = g.category_id
    LEFT JOIN departments cd ON cd.id = c.department_id
    LEFT JOIN departments d ON d.id = g.department_id
    LEFT JOIN users o ON o.id = g.assigned_officer_id
"#;

const REMARK_SELECT: &str = r#"
    SELECT r.id, r.grievance_id, r.officer_id, r.remark, r.created_at,
           u.username, u.first_name, u.last_name, u.email
    FROM grievance_remarks r
    LEFT JOIN users u ON u.id = r.officer_id
"#;

#[derive(sqlx::FromRow)]
struct GrievanceRow {
    id: i64,
    tracking_id: Option<String>,
    user_id: Option<Uuid>,
    title: String,
    description: String,
    category_id: Option<i64>,
    department_id: Option<i64>,
    attachment: Option<String>,
    assigned_officer_id: Option<Uuid>,
    status: GrievanceStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<GrievanceRow> for Grievance {
    type Error = RepositoryError;

    fn try_from(r: GrievanceRow) -> Result<Self, Self::Error> {
        let tracking_id = r
            .tracking_id
            .as_deref()
            .map(TrackingId::parse)
            .transpose()
            .map_err(RepositoryError::Corrupt)?;

        Ok(Grievance::from_persistence(
            r.id,
            tracking_id,
            r.user_id,
            r.title,
            r.description,
            r.category_id,
            r.department_id,
            r.attachment,
            r.assigned_officer_id,
            r.status,
            r.created_at,
            r.updated_at,
        ))
    }
}

#[derive(sqlx::FromRow)]
struct GrievanceViewRow {
    id: i64,
    tracking_id: Option<String>,
    user_id: Option<Uuid>,
    title: String,
    description: String,
    category_id: Option<i64>,
    department_id: Option<i64>,
    attachment: Option<String>,
    assigned_officer_id: Option<Uuid>,
    status: GrievanceStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    filer_username: Option<String>,
    filer_first_name: Option<String>,
    filer_last_name: Option<String>,
    filer_email: Option<String>,
    category_name: Option<String>,
    category_department_id: Option<i64>,
    category_department_name: Option<String>,
    category_department_code: Option<String>,
    department_name: Option<String>,
    department_code: Option<String>,
    officer_username: Option<String>,
    officer_first_name: Option<String>,
    officer_last_name: Option<String>,
    officer_email: Option<String>,
}

impl TryFrom<GrievanceViewRow> for GrievanceView {
    type Error = RepositoryError;

    fn try_from(r: GrievanceViewRow) -> Result<Self, Self::Error> {
        let filer = joined_summary(
            r.user_id,
            r.filer_username,
            r.filer_first_name,
            r.filer_last_name,
            r.filer_email,
        );
        let assigned_officer = joined_summary(
            r.assigned_officer_id,
            r.officer_username,
            r.officer_first_name,
            r.officer_last_name,
            r.officer_email,
        );

        let category = match (r.category_id, r.category_name) {
            (Some(id), Some(name)) => Some(Category {
                id,
                name,
                department: match (r.category_department_id, r.category_department_name) {
                    (Some(id), Some(name)) => Some(DepartmentRef {
                        id,
                        name,
                        code: r.category_department_code,
                    }),
                    _ => None,
                },
            }),
            _ => None,
        };

        let department = match (r.department_id, r.department_name) {
            (Some(id), Some(name)) => Some(DepartmentRef {
                id,
                name,
                code: r.department_code,
            }),
            _ => None,
        };

        let grievance = Grievance::try_from(GrievanceRow {
            id: r.id,
            tracking_id: r.tracking_id,
            user_id: r.user_id,
            title: r.title,
            description: r.description,
            category_id: r.category_id,
            department_id: r.department_id,
            attachment: r.attachment,
            assigned_officer_id: r.assigned_officer_id,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })?;

        Ok(GrievanceView {
            grievance,
            filer,
            category,
            department,
            assigned_officer,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RemarkRow {
    id: i64,
    grievance_id: i64,
    officer_id: Option<Uuid>,
    remark: String,
    created_at: DateTime<Utc>,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
}

impl From<RemarkRow> for Remark {
    fn from(r: RemarkRow) -> Self {
        Remark {
            id: r.id,
            grievance_id: r.grievance_id,
            officer: joined_summary(r.officer_id, r.username, r.first_name, r.last_name, r.email),
            remark: r.remark,
            created_at: r.created_at,
        }
    }
}

/// `%value%` for ILIKE with the LIKE wildcards in `value` escaped
fn contains_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Appends the WHERE clause for `filter`
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &GrievanceFilter) {
    qb.push(" WHERE TRUE");

    if let Some(status) = &filter.status {
        qb.push(" AND g.status::text = ").push_bind(status.clone());
    }

    match &filter.category {
        Some(CategoryFilter::IdOrName(id, name)) => {
            qb.push(" AND (g.category_id = ")
                .push_bind(*id)
                .push(" OR c.name ILIKE ")
                .push_bind(contains_pattern(name))
                .push(")");
        }
        Some(CategoryFilter::Name(name)) => {
            qb.push(" AND c.name ILIKE ").push_bind(contains_pattern(name));
        }
        None => {}
    }

    if let Some(officer) = filter.assigned_officer {
        qb.push(" AND g.assigned_officer_id = ").push_bind(officer);
    }

    if let Some(user) = filter.user {
        qb.push(" AND g.user_id = ").push_bind(user);
    }

    if let Some(search) = &filter.search {
        let pattern = contains_pattern(search);
        qb.push(" AND (");
        let columns = [
            "g.title",
            "g.description",
            "g.tracking_id",
            "fu.username",
            "fu.first_name",
            "fu.last_name",
        ];
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(*column).push(" ILIKE ").push_bind(pattern.clone());
        }
        qb.push(")");
    }

    if let Some(from) = filter.date_from {
        qb.push(" AND (g.created_at AT TIME ZONE 'UTC')::date >= ")
            .push_bind(from);
    }

    if let Some(to) = filter.date_to {
        qb.push(" AND (g.created_at AT TIME ZONE 'UTC')::date <= ")
            .push_bind(to);
    }
}

async fn write_events(
    conn: &mut PgConnection,
    actor: Option<Uuid>,
    grievance_id: i64,
    events: &[GrievanceEvent],
) -> Result<(), sqlx::Error> {
    for event in events {
        insert_change_log(conn, &NewChangeLog::from_event(actor, grievance_id, event)).await?;
    }
    Ok(())
}

/// PostgreSQL implementation of GrievanceRepository
pub struct PostgresGrievanceRepository {
    pool: PgPool,
}

impl PostgresGrievanceRepository {
    /// Creates a new PostgresGrievanceRepository
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GrievanceRepository for PostgresGrievanceRepository {
    async fn create(
        &self,
        grievance: &NewGrievance,
        tracking_prefix: &str,
    ) -> RepositoryResult<Grievance> {
        let mut tx = self.pool.begin().await?;

        let mut row = sqlx::query_as::<_, GrievanceRow>(&format!(
            r#"
            INSERT INTO grievances (
                user_id, title, description, category_id, department_id, attachment
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            GRIEVANCE_COLUMNS
        ))
        .bind(grievance.user_id())
        .bind(grievance.title())
        .bind(grievance.description())
        .bind(grievance.category_id())
        .bind(grievance.department_id())
        .bind(grievance.attachment())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, "Grievance already exists"))?;

        // the key only exists after the insert
        let tracking_id = TrackingId::generate(tracking_prefix, row.created_at.year(), row.id);
        sqlx::query("UPDATE grievances SET tracking_id = $2 WHERE id = $1")
            .bind(row.id)
            .bind(tracking_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(e, "Tracking ID already in use"))?;
        row.tracking_id = Some(tracking_id.as_str().to_string());

        write_events(
            &mut *tx,
            Some(grievance.user_id()),
            row.id,
            &[grievance.created_event()],
        )
        .await?;

        tx.commit().await?;

        Grievance::try_from(row)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Grievance>> {
        let row = sqlx::query_as::<_, GrievanceRow>(&format!(
            "SELECT {} FROM grievances WHERE id = $1",
            GRIEVANCE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Grievance::try_from).transpose()
    }

    async fn find_view(&self, id: i64) -> RepositoryResult<Option<GrievanceView>> {
        let row = sqlx::query_as::<_, GrievanceViewRow>(&format!(
            "{} {} WHERE g.id = $1",
            VIEW_SELECT, VIEW_FROM
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(GrievanceView::try_from).transpose()
    }

    async fn find_by_tracking_id(
        &self,
        tracking_id: &TrackingId,
    ) -> RepositoryResult<Option<Grievance>> {
        let row = sqlx::query_as::<_, GrievanceRow>(&format!(
            "SELECT {} FROM grievances WHERE tracking_id = $1",
            GRIEVANCE_COLUMNS
        ))
        .bind(tracking_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Grievance::try_from).transpose()
    }

    async fn list(
        &self,
        filter: &GrievanceFilter,
        page: Page,
    ) -> RepositoryResult<(i64, Vec<GrievanceView>)> {
        let mut count_qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*)");
        count_qb.push(VIEW_FROM);
        push_filters(&mut count_qb, filter);
        let (total,) = count_qb
            .build_query_as::<(i64,)>()
            .fetch_one(&self.pool)
            .await?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(VIEW_SELECT);
        qb.push(VIEW_FROM);
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY g.created_at DESC, g.id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let rows = qb
            .build_query_as::<GrievanceViewRow>()
            .fetch_all(&self.pool)
            .await?;

        let views = rows
            .into_iter()
            .map(GrievanceView::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total, views))
    }

    async fn save(
        &self,
        grievance: &Grievance,
        actor: Option<Uuid>,
        events: &[GrievanceEvent],
    ) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE grievances SET
                category_id = $2,
                department_id = $3,
                assigned_officer_id = $4,
                status = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(grievance.id())
        .bind(grievance.category_id())
        .bind(grievance.department_id())
        .bind(grievance.assigned_officer_id())
        .bind(grievance.status())
        .bind(grievance.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "Grievance update conflicts with existing data"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "Grievance {}",
                grievance.id()
            )));
        }

        write_events(&mut *tx, actor, grievance.id(), events).await?;

        tx.commit().await?;

        Ok(())
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM grievances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Grievance {}", id)));
        }

        Ok(())
    }

    async fn count_open_assigned(&self, officer_id: Uuid) -> RepositoryResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM grievances
            WHERE assigned_officer_id = $1
              AND status NOT IN ('closed', 'rejected')
            "#,
        )
        .bind(officer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn add_remark(&self, remark: &NewRemark) -> RepositoryResult<Remark> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO grievance_remarks (grievance_id, officer_id, remark)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(remark.grievance_id)
        .bind(remark.officer_id)
        .bind(&remark.remark)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, "Remark already exists"))?;

        write_events(
            &mut *tx,
            Some(remark.officer_id),
            remark.grievance_id,
            &[GrievanceEvent::RemarkAdded { remark_id: id }],
        )
        .await?;

        let row = sqlx::query_as::<_, RemarkRow>(&format!("{} WHERE r.id = $1", REMARK_SELECT))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Remark::from(row))
    }

    async fn remarks(&self, grievance_id: i64) -> RepositoryResult<Vec<Remark>> {
        let rows = sqlx::query_as::<_, RemarkRow>(&format!(
            "{} WHERE r.grievance_id = $1 ORDER BY r.created_at, r.id",
            REMARK_SELECT
        ))
        .bind(grievance_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Remark::from).collect())
    }

    async fn add_feedback(
        &self,
        feedback: &NewFeedback,
        actor: Uuid,
        event: &GrievanceEvent,
    ) -> RepositoryResult<Feedback> {
        let mut tx = self.pool.begin().await?;

        let stored = sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO feedback (grievance_id, rating, comments)
            VALUES ($1, $2, $3)
            RETURNING id, grievance_id, rating, comments, submitted_at
            "#,
        )
        .bind(feedback.grievance_id)
        .bind(feedback.rating.value())
        .bind(&feedback.comments)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, "Feedback already submitted for this grievance"))?;

        write_events(
            &mut *tx,
            Some(actor),
            feedback.grievance_id,
            std::slice::from_ref(event),
        )
        .await?;

        tx.commit().await?;

        Ok(stored)
    }

    async fn feedback(&self, grievance_id: i64) -> RepositoryResult<Option<Feedback>> {
        let row = sqlx::query_as::<_, Feedback>(
            r#"
            SELECT id, grievance_id, rating, comments, submitted_at
            FROM feedback
            WHERE grievance_id = $1
            "#,
        )
        .bind(grievance_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn history(&self, grievance_id: i64) -> RepositoryResult<Vec<ChangeLogEntry>> {
        let rows = sqlx::query_as::<_, ChangeLogRow>(&format!(
            "{} WHERE l.grievance_id = $1 ORDER BY l.logged_at DESC, l.id DESC",
            CHANGE_LOG_SELECT
        ))
        .bind(grievance_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ChangeLogEntry::from).collect())
    }
}
