use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::events::GrievanceEvent;
use crate::domain::repositories::user_repository::UserSummary;

/// Audit entry waiting to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChangeLog {
    /// Acting user; None for system actions
    pub user_id: Option<Uuid>,
    pub grievance_id: Option<i64>,
    pub action: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl NewChangeLog {
    /// Audit entry for a grievance lifecycle event
    pub fn from_event(actor: Option<Uuid>, grievance_id: i64, event: &GrievanceEvent) -> Self {
        Self {
            user_id: actor,
            grievance_id: Some(grievance_id),
            action: event.action().to_string(),
            before: event.before(),
            after: event.after(),
        }
    }

    /// Audit entry for user administration, not tied to a grievance
    pub fn for_user_admin(
        actor: Uuid,
        action: &str,
        before: Option<String>,
        after: Option<String>,
    ) -> Self {
        Self {
            user_id: Some(actor),
            grievance_id: None,
            action: action.to_string(),
            before,
            after,
        }
    }
}

/// Stored audit entry with the acting user
#[derive(Debug, Clone)]
pub struct ChangeLogEntry {
    pub id: i64,
    pub user: Option<UserSummary>,
    pub grievance_id: Option<i64>,
    pub action: String,
    pub before: Option<String>,
    pub after: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grievance::value_objects::GrievanceStatus;

    #[test]
    fn entry_from_status_event() {
        let actor = Uuid::new_v4();
        let event = GrievanceEvent::StatusChanged {
            from: GrievanceStatus::InProgress,
            to: GrievanceStatus::Resolved,
        };

        let entry = NewChangeLog::from_event(Some(actor), 42, &event);
        assert_eq!(entry.user_id, Some(actor));
        assert_eq!(entry.grievance_id, Some(42));
        assert_eq!(entry.action, "status_changed");
        assert_eq!(entry.before.as_deref(), Some("in_progress"));
        assert_eq!(entry.after.as_deref(), Some("resolved"));
    }

    #[test]
    fn user_admin_entry_has_no_grievance() {
        let entry = NewChangeLog::for_user_admin(
            Uuid::new_v4(),
            "user_updated",
            Some("role=citizen".into()),
            Some("role=officer".into()),
        );
        assert_eq!(entry.grievance_id, None);
        assert_eq!(entry.action, "user_updated");
    }
}
