// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod postgres_analytics_repository;
pub mod postgres_catalog_repository;
pub mod postgres_change_log_repository;
pub mod postgres_grievance_repository;
pub mod postgres_user_repository;

pub use postgres_analytics_repository::PostgresAnalyticsRepository;
pub use postgres_catalog_repository::{PostgresCategoryRepository, PostgresDepartmentRepository};
pub use postgres_change_log_repository::PostgresChangeLogRepository;
pub use postgres_grievance_repository::PostgresGrievanceRepository;
pub use postgres_user_repository::PostgresUserRepository;

use crate::domain::repositories::RepositoryError;

/// Maps constraint violations on writes to `Conflict`
///
/// `duplicate` describes the unique constraint that is expected to fire.
pub(crate) fn write_error(e: sqlx::Error, duplicate: &str) -> RepositoryError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return RepositoryError::Conflict(duplicate.to_string());
        }
        if db.is_foreign_key_violation() {
            return RepositoryError::Conflict("Referenced record does not exist".to_string());
        }
    }
    RepositoryError::Database(e)
}
