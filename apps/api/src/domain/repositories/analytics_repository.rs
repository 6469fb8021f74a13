use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::RepositoryResult;
use crate::domain::grievance::GrievanceStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: GrievanceStatus,
    pub count: i64,
}

/// Grievance count per category or department; `id`/`name` are None for
/// unclassified grievances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct GroupCount {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct OfficerLoad {
    pub id: Uuid,
    pub username: String,
    pub count: i64,
}

/// Portal-wide numbers for the admin analytics view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub total: i64,
    pub by_status: Vec<StatusCount>,
    pub by_category: Vec<GroupCount>,
    pub by_department: Vec<GroupCount>,
    pub by_officer: Vec<OfficerLoad>,
    pub feedback_count: i64,
    /// Rounded to two places; None without feedback
    pub average_rating: Option<Decimal>,
    pub last_30_days: i64,
}

/// An officer's own workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfficerDashboard {
    pub officer_id: Uuid,
    pub total_assigned: i64,
    pub by_status: Vec<StatusCount>,
}

/// Read-only aggregate queries
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn summary(&self) -> RepositoryResult<AnalyticsSummary>;

    async fn officer_dashboard(&self, officer_id: Uuid) -> RepositoryResult<OfficerDashboard>;
}
