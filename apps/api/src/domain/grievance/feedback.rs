use chrono::{DateTime, Utc};

use super::events::GrievanceEvent;
use super::grievance::Grievance;
use super::value_objects::Rating;

/// Citizen rating of a resolved grievance, validated before insert
///
/// At most one exists per grievance; the unique constraint on
/// `feedback.grievance_id` backs this up.
#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub grievance_id: i64,
    pub rating: Rating,
    pub comments: Option<String>,
}

impl NewFeedback {
    /// Builds feedback for `grievance` and the event to log with it
    ///
    /// Ownership is checked by the caller; this enforces the rating bounds and
    /// that the grievance has been resolved or closed.
    pub fn for_grievance(
        grievance: &Grievance,
        rating: i64,
        comments: Option<String>,
    ) -> Result<(Self, GrievanceEvent), String> {
        if !grievance.status().accepts_feedback() {
            return Err(format!(
                "Feedback can only be given on resolved or closed grievances (status is {})",
                grievance.status()
            ));
        }
        let rating = Rating::new(rating)?;
        let comments = comments
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let event = GrievanceEvent::FeedbackSubmitted {
            rating: rating.value(),
        };
        Ok((
            Self {
                grievance_id: grievance.id(),
                rating,
                comments,
            },
            event,
        ))
    }
}

/// Stored feedback
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Feedback {
    pub id: i64,
    pub grievance_id: i64,
    pub rating: i16,
    pub comments: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grievance::value_objects::GrievanceStatus;
    use uuid::Uuid;

    fn grievance(status: GrievanceStatus) -> Grievance {
        let now = Utc::now();
        Grievance::from_persistence(
            11,
            None,
            Some(Uuid::new_v4()),
            "Title".to_string(),
            "Description".to_string(),
            None,
            None,
            None,
            None,
            status,
            now,
            now,
        )
    }

    #[test]
    fn feedback_on_resolved_grievance() {
        let (feedback, event) = NewFeedback::for_grievance(
            &grievance(GrievanceStatus::Resolved),
            4,
            Some(" quick fix ".to_string()),
        )
        .unwrap();

        assert_eq!(feedback.grievance_id, 11);
        assert_eq!(feedback.rating.value(), 4);
        assert_eq!(feedback.comments.as_deref(), Some("quick fix"));
        assert_eq!(event, GrievanceEvent::FeedbackSubmitted { rating: 4 });
    }

    #[test]
    fn feedback_before_resolution_rejected() {
        let err = NewFeedback::for_grievance(&grievance(GrievanceStatus::InProgress), 5, None)
            .unwrap_err();
        assert!(err.contains("in_progress"));
    }

    #[test]
    fn feedback_rating_out_of_range_rejected() {
        assert!(NewFeedback::for_grievance(&grievance(GrievanceStatus::Closed), 0, None).is_err());
        assert!(NewFeedback::for_grievance(&grievance(GrievanceStatus::Closed), 6, None).is_err());
    }
}
