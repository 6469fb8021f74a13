use async_trait::async_trait;
use uuid::Uuid;

use super::user_repository::UserSummary;
use super::RepositoryResult;
use crate::domain::catalog::{Category, DepartmentRef};
use crate::domain::grievance::{
    ChangeLogEntry, Feedback, Grievance, GrievanceEvent, GrievanceFilter, NewFeedback,
    NewGrievance, NewRemark, Page, Remark, TrackingId,
};

/// Grievance joined with the records it references, for responses
#[derive(Debug, Clone)]
pub struct GrievanceView {
    pub grievance: Grievance,
    pub filer: Option<UserSummary>,
    pub category: Option<Category>,
    pub department: Option<DepartmentRef>,
    pub assigned_officer: Option<UserSummary>,
}

/// Repository trait for the Grievance aggregate
///
/// Every write that carries events stores the matching change-log entries
/// in the same transaction.
#[async_trait]
pub trait GrievanceRepository: Send + Sync {
    /// Insert, assign the tracking ID from the new key, and log `created`
    async fn create(&self, grievance: &NewGrievance, tracking_prefix: &str)
        -> RepositoryResult<Grievance>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Grievance>>;

    async fn find_view(&self, id: i64) -> RepositoryResult<Option<GrievanceView>>;

    async fn find_by_tracking_id(&self, tracking_id: &TrackingId)
        -> RepositoryResult<Option<Grievance>>;

    /// Matching rows (newest first) and the total count before paging
    async fn list(
        &self,
        filter: &GrievanceFilter,
        page: Page,
    ) -> RepositoryResult<(i64, Vec<GrievanceView>)>;

    /// Persist mutable fields and log `events` as `actor`
    async fn save(
        &self,
        grievance: &Grievance,
        actor: Option<Uuid>,
        events: &[GrievanceEvent],
    ) -> RepositoryResult<()>;

    async fn delete(&self, id: i64) -> RepositoryResult<()>;

    /// Assigned to `officer_id` and not yet closed or rejected
    async fn count_open_assigned(&self, officer_id: Uuid) -> RepositoryResult<i64>;

    /// Insert a remark and log `remark_added`
    async fn add_remark(&self, remark: &NewRemark) -> RepositoryResult<Remark>;

    /// Remarks oldest first
    async fn remarks(&self, grievance_id: i64) -> RepositoryResult<Vec<Remark>>;

    /// Insert feedback and log `event`; a second feedback is a conflict
    async fn add_feedback(
        &self,
        feedback: &NewFeedback,
        actor: Uuid,
        event: &GrievanceEvent,
    ) -> RepositoryResult<Feedback>;

    async fn feedback(&self, grievance_id: i64) -> RepositoryResult<Option<Feedback>>;

    /// Change log for one grievance, newest first
    async fn history(&self, grievance_id: i64) -> RepositoryResult<Vec<ChangeLogEntry>>;
}
