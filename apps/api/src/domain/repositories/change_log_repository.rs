use async_trait::async_trait;

use super::RepositoryResult;
use crate::domain::grievance::{ChangeLogEntry, NewChangeLog};

/// Repository trait for audit entries not written as part of a grievance
/// mutation
#[async_trait]
pub trait ChangeLogRepository: Send + Sync {
    async fn record(&self, entry: &NewChangeLog) -> RepositoryResult<()>;

    /// Most recent entries across the portal, newest first
    async fn recent(&self, limit: i64) -> RepositoryResult<Vec<ChangeLogEntry>>;
}
