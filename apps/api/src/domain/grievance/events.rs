use uuid::Uuid;

use super::value_objects::GrievanceStatus;

/// Domain events that occur within the Grievance aggregate
///
/// Every event is written to the change log in the same transaction as the
/// mutation that produced it.
///
/// # Example
/// ```
/// use grievance_portal_api::domain::grievance::events::GrievanceEvent;
/// use grievance_portal_api::domain::grievance::GrievanceStatus;
///
/// let event = GrievanceEvent::StatusChanged {
///     from: GrievanceStatus::New,
///     to: GrievanceStatus::InProgress,
/// };
/// assert_eq!(event.action(), "status_changed");
/// assert_eq!(event.before().as_deref(), Some("new"));
/// assert_eq!(event.after().as_deref(), Some("in_progress"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrievanceEvent {
    /// Grievance was filed
    Created {
        /// Title at filing time
        title: String,
    },
    /// Status moved along the lifecycle
    StatusChanged {
        from: GrievanceStatus,
        to: GrievanceStatus,
    },
    /// Officer (re)assigned
    Assigned {
        /// Previously assigned officer
        from: Option<Uuid>,
        /// Newly assigned officer
        to: Uuid,
    },
    /// Category or department changed
    Reclassified {
        from_category: Option<i64>,
        to_category: Option<i64>,
        from_department: Option<i64>,
        to_department: Option<i64>,
    },
    /// Officer or admin left a remark
    RemarkAdded { remark_id: i64 },
    /// Filer rated the resolution
    FeedbackSubmitted { rating: i16 },
}

impl GrievanceEvent {
    /// Change-log action name for this event
    pub fn action(&self) -> &'static str {
        match self {
            GrievanceEvent::Created { .. } => "created",
            GrievanceEvent::StatusChanged { .. } => "status_changed",
            GrievanceEvent::Assigned { .. } => "assigned",
            GrievanceEvent::Reclassified { .. } => "reclassified",
            GrievanceEvent::RemarkAdded { .. } => "remark_added",
            GrievanceEvent::FeedbackSubmitted { .. } => "feedback_submitted",
        }
    }

    /// Change-log "before" value
    pub fn before(&self) -> Option<String> {
        match self {
            GrievanceEvent::StatusChanged { from, .. } => Some(from.to_string()),
            GrievanceEvent::Assigned { from, .. } => from.map(|id| id.to_string()),
            GrievanceEvent::Reclassified {
                from_category,
                from_department,
                ..
            } => Some(classification(*from_category, *from_department)),
            _ => None,
        }
    }

    /// Change-log "after" value
    pub fn after(&self) -> Option<String> {
        match self {
            GrievanceEvent::Created { title } => Some(title.clone()),
            GrievanceEvent::StatusChanged { to, .. } => Some(to.to_string()),
            GrievanceEvent::Assigned { to, .. } => Some(to.to_string()),
            GrievanceEvent::Reclassified {
                to_category,
                to_department,
                ..
            } => Some(classification(*to_category, *to_department)),
            GrievanceEvent::RemarkAdded { remark_id } => Some(remark_id.to_string()),
            GrievanceEvent::FeedbackSubmitted { rating } => Some(rating.to_string()),
        }
    }
}

fn classification(category: Option<i64>, department: Option<i64>) -> String {
    let show = |id: Option<i64>| id.map_or_else(|| "none".to_string(), |v| v.to_string());
    format!("category={} department={}", show(category), show(department))
}
