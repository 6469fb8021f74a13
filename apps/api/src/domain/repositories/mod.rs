// Repository traits (ports)
// Infrastructure provides the PostgreSQL adapters

pub mod analytics_repository;
pub mod catalog_repository;
pub mod change_log_repository;
pub mod grievance_repository;
pub mod user_repository;

pub use analytics_repository::AnalyticsRepository;
pub use catalog_repository::{CategoryRepository, DepartmentRepository};
pub use change_log_repository::ChangeLogRepository;
pub use grievance_repository::GrievanceRepository;
pub use user_repository::UserRepository;

use thiserror::Error;

/// Errors surfaced by repository implementations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(String),

    /// Unique or foreign-key constraint rejected the write
    #[error("{0}")]
    Conflict(String),

    #[error("Invalid data from database: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
