use axum::{extract::State, Json};
use serde::Serialize;
use sqlx::PgPool;

use super::grievances::GrievanceResponse;
use crate::api::errors::ApiError;
use crate::api::middleware::AuthUser;
use crate::domain::grievance::{GrievanceFilter, Page};
use crate::domain::repositories::analytics_repository::{AnalyticsSummary, OfficerDashboard};
use crate::domain::repositories::user_repository::UserStatusCounts;
use crate::domain::repositories::{AnalyticsRepository, GrievanceRepository, UserRepository};
use crate::infrastructure::repositories::{
    PostgresAnalyticsRepository, PostgresGrievanceRepository, PostgresUserRepository,
};

const DASHBOARD_RECENT: i64 = 5;

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    #[serde(flatten)]
    pub grievances: AnalyticsSummary,
    pub users: UserStatusCounts,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub workload: OfficerDashboard,
    pub recent: Vec<GrievanceResponse>,
}

/// Portal-wide grievance and user numbers
///
/// GET /api/admin/analytics
pub async fn admin_analytics(
    user: AuthUser,
    State(pool): State<PgPool>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    user.require_admin()?;

    let grievances = PostgresAnalyticsRepository::new(pool.clone())
        .summary()
        .await?;
    let users = PostgresUserRepository::new(pool).status_counts().await?;

    Ok(Json(AnalyticsResponse { grievances, users }))
}

/// The caller's assigned workload and latest assignments
///
/// GET /api/officer/dashboard
pub async fn officer_dashboard(
    user: AuthUser,
    State(pool): State<PgPool>,
) -> Result<Json<DashboardResponse>, ApiError> {
    user.require_staff()?;

    let workload = PostgresAnalyticsRepository::new(pool.clone())
        .officer_dashboard(user.id)
        .await?;

    let filter = GrievanceFilter {
        assigned_officer: Some(user.id),
        ..Default::default()
    };
    let (_, recent) = PostgresGrievanceRepository::new(pool)
        .list(&filter, Page::new(DASHBOARD_RECENT, 0))
        .await?;

    Ok(Json(DashboardResponse {
        workload,
        recent: recent.into_iter().map(GrievanceResponse::from).collect(),
    }))
}
