use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a grievance
///
/// # Status Transitions
/// ```text
/// New -> InProgress -> Resolved -> Closed
///  |        |   ^          |
///  |        v   |          +-> InProgress (reopen)
///  |      Escalated -> Resolved | Closed
///  +-> Rejected
///  +-> Closed
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "grievance_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GrievanceStatus {
    /// Filed, not yet picked up
    #[default]
    New,
    /// An officer is working on it
    InProgress,
    /// Work is done, awaiting closure or citizen feedback
    Resolved,
    /// Raised to a higher authority
    Escalated,
    /// Finished, no further changes
    Closed,
    /// Dismissed as invalid or out of scope
    Rejected,
}

impl GrievanceStatus {
    pub const ALL: [GrievanceStatus; 6] = [
        GrievanceStatus::New,
        GrievanceStatus::InProgress,
        GrievanceStatus::Resolved,
        GrievanceStatus::Escalated,
        GrievanceStatus::Closed,
        GrievanceStatus::Rejected,
    ];

    /// Checks if a transition from current status to next status is valid
    ///
    /// # Example
    /// ```
    /// use grievance_portal_api::domain::grievance::value_objects::GrievanceStatus;
    ///
    /// assert!(GrievanceStatus::New.can_transition_to(GrievanceStatus::InProgress));
    /// assert!(!GrievanceStatus::Closed.can_transition_to(GrievanceStatus::New));
    /// ```
    pub fn can_transition_to(&self, next: GrievanceStatus) -> bool {
        use GrievanceStatus::*;
        matches!(
            (self, next),
            (New, InProgress)
                | (New, Escalated)
                | (New, Rejected)
                | (New, Closed)
                | (InProgress, Resolved)
                | (InProgress, Escalated)
                | (InProgress, Rejected)
                | (InProgress, Closed)
                | (Escalated, InProgress)
                | (Escalated, Resolved)
                | (Escalated, Closed)
                | (Resolved, Closed)
                | (Resolved, InProgress)
        )
    }

    /// No transition leaves a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, GrievanceStatus::Closed | GrievanceStatus::Rejected)
    }

    /// Statuses in which the filer may leave feedback
    pub fn accepts_feedback(&self) -> bool {
        matches!(self, GrievanceStatus::Resolved | GrievanceStatus::Closed)
    }

    /// Lowercase snake form of user input, e.g. `"In Progress"` -> `"in_progress"`
    pub fn normalize(input: &str) -> String {
        input.trim().to_ascii_lowercase().replace(' ', "_")
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GrievanceStatus::New => "new",
            GrievanceStatus::InProgress => "in_progress",
            GrievanceStatus::Resolved => "resolved",
            GrievanceStatus::Escalated => "escalated",
            GrievanceStatus::Closed => "closed",
            GrievanceStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for GrievanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrievanceStatus {
    type Err = String;

    /// Case-insensitive; accepts the display labels with spaces too
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = GrievanceStatus::normalize(s);
        GrievanceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| "Invalid status value.".to_string())
    }
}

/// Human-readable grievance identifier, `{PREFIX}-{YEAR}-{ID:06}`
///
/// Derived from the primary key after the first insert, so uniqueness follows
/// from the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackingId(String);

impl TrackingId {
    pub const DEFAULT_PREFIX: &'static str = "KER";

    /// Builds the tracking ID for a stored grievance
    ///
    /// # Example
    /// ```
    /// use grievance_portal_api::domain::grievance::value_objects::TrackingId;
    ///
    /// let id = TrackingId::generate("KER", 2026, 42);
    /// assert_eq!(id.as_str(), "KER-2026-000042");
    /// ```
    pub fn generate(prefix: &str, year: i32, id: i64) -> Self {
        TrackingId(format!("{}-{}-{:06}", prefix, year, id))
    }

    /// Validates an externally supplied tracking ID
    pub fn parse(value: &str) -> Result<Self, String> {
        let value = value.trim();
        let invalid = || format!("Invalid tracking ID: {}", value);

        let mut parts = value.rsplitn(3, '-');
        let seq = parts.next().ok_or_else(invalid)?;
        let year = parts.next().ok_or_else(invalid)?;
        let prefix = parts.next().ok_or_else(invalid)?;

        let prefix_ok = !prefix.is_empty()
            && prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        let year_ok = year.len() == 4 && year.chars().all(|c| c.is_ascii_digit());
        let seq_ok = seq.len() >= 6 && seq.chars().all(|c| c.is_ascii_digit());

        if prefix_ok && year_ok && seq_ok {
            Ok(TrackingId(value.to_string()))
        } else {
            Err(invalid())
        }
    }

    /// Primary key encoded in the tracking ID
    pub fn sequence(&self) -> Option<i64> {
        self.0.rsplit('-').next().and_then(|s| s.parse().ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Citizen satisfaction rating, 1 to 5 inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Rating(i16);

impl Rating {
    pub const MIN: i16 = 1;
    pub const MAX: i16 = 5;

    pub fn new(value: i64) -> Result<Self, String> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Rating(value as i16))
        } else {
            Err(format!(
                "Rating must be between {} and {}",
                Self::MIN,
                Self::MAX
            ))
        }
    }

    pub fn value(&self) -> i16 {
        self.0
    }
}
