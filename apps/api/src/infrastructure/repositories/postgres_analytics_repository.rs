use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::repositories::analytics_repository::{
    AnalyticsRepository, AnalyticsSummary, GroupCount, OfficerDashboard, OfficerLoad, StatusCount,
};
use crate::domain::repositories::RepositoryResult;

/// PostgreSQL implementation of AnalyticsRepository
pub struct PostgresAnalyticsRepository {
    pool: PgPool,
}

impl PostgresAnalyticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsRepository for PostgresAnalyticsRepository {
    async fn summary(&self) -> RepositoryResult<AnalyticsSummary> {
        let (total, last_30_days): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE created_at >= NOW() - INTERVAL '30 days')
            FROM grievances
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let by_status = sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM grievances
            GROUP BY status
            ORDER BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let by_category = sqlx::query_as::<_, GroupCount>(
            r#"
            SELECT c.id, c.name, COUNT(*) AS count
            FROM grievances g
            LEFT JOIN categories c ON c.id = g.category_id
            GROUP BY c.id, c.name
            ORDER BY count DESC, c.name NULLS LAST
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let by_department = sqlx::query_as::<_, GroupCount>(
            r#"
            SELECT d.id, d.name, COUNT(*) AS count
            FROM grievances g
            LEFT JOIN departments d ON d.id = g.department_id
            GROUP BY d.id, d.name
            ORDER BY count DESC, d.name NULLS LAST
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let by_officer = sqlx::query_as::<_, OfficerLoad>(
            r#"
            SELECT u.id, u.username, COUNT(*) AS count
            FROM grievances g
            JOIN users u ON u.id = g.assigned_officer_id
            GROUP BY u.id, u.username
            ORDER BY count DESC, u.username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let (feedback_count, average_rating): (i64, Option<Decimal>) = sqlx::query_as(
            "SELECT COUNT(*), ROUND(AVG(rating), 2) FROM feedback",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AnalyticsSummary {
            total,
            by_status,
            by_category,
            by_department,
            by_officer,
            feedback_count,
            average_rating,
            last_30_days,
        })
    }

    async fn officer_dashboard(&self, officer_id: Uuid) -> RepositoryResult<OfficerDashboard> {
        let by_status = sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM grievances
            WHERE assigned_officer_id = $1
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(officer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(OfficerDashboard {
            officer_id,
            total_assigned: by_status.iter().map(|s| s.count).sum(),
            by_status,
        })
    }
}
