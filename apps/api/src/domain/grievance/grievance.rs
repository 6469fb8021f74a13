use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::events::GrievanceEvent;
use super::value_objects::{GrievanceStatus, TrackingId};

pub const TITLE_MAX_LEN: usize = 255;

/// A grievance that has been validated but not stored yet
///
/// The primary key and therefore the tracking ID only exist after the
/// repository inserts it.
///
/// # Example
/// ```
/// use grievance_portal_api::domain::grievance::NewGrievance;
/// use uuid::Uuid;
///
/// let new = NewGrievance::new(
///     Uuid::new_v4(),
///     "Water supply disrupted".to_string(),
///     "No water in ward 12 since Monday".to_string(),
///     None,
///     None,
///     None,
/// ).expect("valid grievance");
///
/// assert_eq!(new.title(), "Water supply disrupted");
/// ```
#[derive(Debug, Clone)]
pub struct NewGrievance {
    user_id: Uuid,
    title: String,
    description: String,
    category_id: Option<i64>,
    department_id: Option<i64>,
    attachment: Option<String>,
}

impl NewGrievance {
    /// Validates a grievance being filed
    ///
    /// # Business Rules Enforced
    /// - Title must not be blank and is at most 255 characters
    /// - Description must not be blank
    /// - Blank attachment references are dropped
    pub fn new(
        user_id: Uuid,
        title: String,
        description: String,
        category_id: Option<i64>,
        department_id: Option<i64>,
        attachment: Option<String>,
    ) -> Result<Self, String> {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err("Title cannot be empty".to_string());
        }
        if title.chars().count() > TITLE_MAX_LEN {
            return Err(format!(
                "Title must be at most {} characters",
                TITLE_MAX_LEN
            ));
        }

        let description = description.trim().to_string();
        if description.is_empty() {
            return Err("Description cannot be empty".to_string());
        }

        let attachment = attachment
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        Ok(Self {
            user_id,
            title,
            description,
            category_id,
            department_id,
            attachment,
        })
    }

    /// Fills the department from the chosen category when none was given
    pub fn with_default_department(mut self, category_department: Option<i64>) -> Self {
        if self.department_id.is_none() {
            self.department_id = category_department;
        }
        self
    }

    /// Event recorded once the grievance is stored
    pub fn created_event(&self) -> GrievanceEvent {
        GrievanceEvent::Created {
            title: self.title.clone(),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category_id(&self) -> Option<i64> {
        self.category_id
    }

    pub fn department_id(&self) -> Option<i64> {
        self.department_id
    }

    pub fn attachment(&self) -> Option<&str> {
        self.attachment.as_deref()
    }
}

/// Grievance aggregate root
///
/// Enforces the lifecycle rules: status changes follow
/// [`GrievanceStatus::can_transition_to`], every effective mutation yields a
/// [`GrievanceEvent`] for the change log, and repeating the current value is a
/// no-op that yields nothing.
#[derive(Debug, Clone)]
pub struct Grievance {
    id: i64,
    tracking_id: Option<TrackingId>,
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

impl Grievance {
    /// Moves the grievance to `next`
    ///
    /// # Returns
    /// * `Ok(Some(event))` - status changed
    /// * `Ok(None)` - already in `next`
    /// * `Err(String)` - transition not allowed
    pub fn change_status(
        &mut self,
        next: GrievanceStatus,
    ) -> Result<Option<GrievanceEvent>, String> {
        if self.status == next {
            return Ok(None);
        }
        if !self.status.can_transition_to(next) {
            return Err(format!(
                "Cannot move grievance from {} to {}",
                self.status, next
            ));
        }

        let from = self.status;
        self.status = next;
        self.touch();

        Ok(Some(GrievanceEvent::StatusChanged { from, to: next }))
    }

    /// Assigns an officer; the caller has already checked the user's role
    ///
    /// Closed and rejected grievances cannot be reassigned.
    pub fn assign(&mut self, officer_id: Uuid) -> Result<Option<GrievanceEvent>, String> {
        if self.assigned_officer_id == Some(officer_id) {
            return Ok(None);
        }
        if self.status.is_terminal() {
            return Err(format!("Cannot assign a {} grievance", self.status));
        }

        let from = self.assigned_officer_id.replace(officer_id);
        self.touch();

        Ok(Some(GrievanceEvent::Assigned {
            from,
            to: officer_id,
        }))
    }

    /// Changes category and/or department
    pub fn reclassify(
        &mut self,
        category_id: Option<i64>,
        department_id: Option<i64>,
    ) -> Option<GrievanceEvent> {
        if self.category_id == category_id && self.department_id == department_id {
            return None;
        }

        let event = GrievanceEvent::Reclassified {
            from_category: self.category_id,
            to_category: category_id,
            from_department: self.department_id,
            to_department: department_id,
        };
        self.category_id = category_id;
        self.department_id = department_id;
        self.touch();

        Some(event)
    }

    /// True when `user_id` filed this grievance
    pub fn is_filed_by(&self, user_id: Uuid) -> bool {
        self.user_id == Some(user_id)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // ===== Getters =====

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn tracking_id(&self) -> Option<&TrackingId> {
        self.tracking_id.as_ref()
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category_id(&self) -> Option<i64> {
        self.category_id
    }

    pub fn department_id(&self) -> Option<i64> {
        self.department_id
    }

    pub fn attachment(&self) -> Option<&str> {
        self.attachment.as_deref()
    }

    pub fn assigned_officer_id(&self) -> Option<Uuid> {
        self.assigned_officer_id
    }

    pub fn status(&self) -> GrievanceStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Reconstructs a Grievance from persistence layer data
    ///
    /// Bypasses validation; only repository implementations call this.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: i64,
        tracking_id: Option<TrackingId>,
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
    ) -> Self {
        Self {
            id,
            tracking_id,
            user_id,
            title,
            description,
            category_id,
            department_id,
            attachment,
            assigned_officer_id,
            status,
            created_at,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(status: GrievanceStatus) -> Grievance {
        let now = Utc::now();
        Grievance::from_persistence(
            1,
            Some(TrackingId::generate("KER", 2026, 1)),
            Some(Uuid::new_v4()),
            "Pothole on MG Road".to_string(),
            "Large pothole near bus stop".to_string(),
            Some(2),
            Some(1),
            None,
            None,
            status,
            now,
            now,
        )
    }

    #[test]
    fn new_grievance_trims_and_validates() {
        let user = Uuid::new_v4();
        let new = NewGrievance::new(
            user,
            "  Garbage not collected ".to_string(),
            " Bins overflowing ".to_string(),
            Some(4),
            None,
            Some("   ".to_string()),
        )
        .unwrap();

        assert_eq!(new.user_id(), user);
        assert_eq!(new.title(), "Garbage not collected");
        assert_eq!(new.description(), "Bins overflowing");
        assert_eq!(new.category_id(), Some(4));
        assert_eq!(new.attachment(), None);
    }

    #[test]
    fn new_grievance_requires_title_and_description() {
        let user = Uuid::new_v4();
        let err = NewGrievance::new(user, " ".into(), "x".into(), None, None, None).unwrap_err();
        assert!(err.contains("Title cannot be empty"));

        let err = NewGrievance::new(user, "x".into(), "".into(), None, None, None).unwrap_err();
        assert!(err.contains("Description cannot be empty"));
    }

    #[test]
    fn new_grievance_title_length_limit() {
        let user = Uuid::new_v4();
        let long = "t".repeat(TITLE_MAX_LEN + 1);
        assert!(NewGrievance::new(user, long, "d".into(), None, None, None).is_err());

        let max = "t".repeat(TITLE_MAX_LEN);
        assert!(NewGrievance::new(user, max, "d".into(), None, None, None).is_ok());
    }

    #[test]
    fn department_defaults_from_category_only_when_missing() {
        let user = Uuid::new_v4();
        let filled = NewGrievance::new(user, "t".into(), "d".into(), Some(1), None, None)
            .unwrap()
            .with_default_department(Some(9));
        assert_eq!(filled.department_id(), Some(9));

        let explicit = NewGrievance::new(user, "t".into(), "d".into(), Some(1), Some(3), None)
            .unwrap()
            .with_default_department(Some(9));
        assert_eq!(explicit.department_id(), Some(3));
    }

    #[test]
    fn change_status_emits_event() {
        let mut grievance = stored(GrievanceStatus::New);
        let event = grievance
            .change_status(GrievanceStatus::InProgress)
            .unwrap()
            .expect("event");

        assert_eq!(grievance.status(), GrievanceStatus::InProgress);
        assert_eq!(
            event,
            GrievanceEvent::StatusChanged {
                from: GrievanceStatus::New,
                to: GrievanceStatus::InProgress
            }
        );
    }

    #[test]
    fn change_status_to_same_is_noop() {
        let mut grievance = stored(GrievanceStatus::Resolved);
        assert_eq!(grievance.change_status(GrievanceStatus::Resolved).unwrap(), None);
    }

    #[test]
    fn disallowed_transition_leaves_status_unchanged() {
        let mut grievance = stored(GrievanceStatus::Rejected);
        let err = grievance.change_status(GrievanceStatus::InProgress).unwrap_err();
        assert!(err.contains("rejected"));
        assert_eq!(grievance.status(), GrievanceStatus::Rejected);
    }

    #[test]
    fn assign_records_previous_officer() {
        let mut grievance = stored(GrievanceStatus::New);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        let event = grievance.assign(first).unwrap().expect("event");
        assert_eq!(event, GrievanceEvent::Assigned { from: None, to: first });

        assert_eq!(grievance.assign(first).unwrap(), None);

        let event = grievance.assign(second).unwrap().expect("event");
        assert_eq!(
            event,
            GrievanceEvent::Assigned {
                from: Some(first),
                to: second
            }
        );
        assert_eq!(grievance.assigned_officer_id(), Some(second));
        // assignment does not move the status
        assert_eq!(grievance.status(), GrievanceStatus::New);
    }

    #[test]
    fn closed_grievance_cannot_be_assigned() {
        let mut grievance = stored(GrievanceStatus::Closed);
        assert!(grievance.assign(Uuid::new_v4()).is_err());
        assert_eq!(grievance.assigned_officer_id(), None);
    }

    #[test]
    fn reclassify_only_on_change() {
        let mut grievance = stored(GrievanceStatus::New);
        assert!(grievance.reclassify(Some(2), Some(1)).is_none());

        let event = grievance.reclassify(Some(5), Some(1)).expect("event");
        assert_eq!(event.action(), "reclassified");
        assert_eq!(grievance.category_id(), Some(5));
    }

    #[test]
    fn ownership_check() {
        let grievance = stored(GrievanceStatus::New);
        let owner = grievance.user_id().unwrap();
        assert!(grievance.is_filed_by(owner));
        assert!(!grievance.is_filed_by(Uuid::new_v4()));
    }
}
