use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::repositories::user_repository::UserSummary;

/// Officer note on a grievance, validated before insert
#[derive(Debug, Clone)]
pub struct NewRemark {
    pub grievance_id: i64,
    pub officer_id: Uuid,
    pub remark: String,
}

impl NewRemark {
    pub fn new(grievance_id: i64, officer_id: Uuid, remark: &str) -> Result<Self, String> {
        let remark = remark.trim();
        if remark.is_empty() {
            return Err("remark text required".to_string());
        }
        Ok(Self {
            grievance_id,
            officer_id,
            remark: remark.to_string(),
        })
    }
}

/// Stored remark with its author
#[derive(Debug, Clone)]
pub struct Remark {
    pub id: i64,
    pub grievance_id: i64,
    /// None once the author account is deleted
    pub officer: Option<UserSummary>,
    pub remark: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remark_is_trimmed() {
        let remark = NewRemark::new(3, Uuid::new_v4(), "  Site visited  ").unwrap();
        assert_eq!(remark.remark, "Site visited");
        assert_eq!(remark.grievance_id, 3);
    }

    #[test]
    fn blank_remark_rejected() {
        assert!(NewRemark::new(3, Uuid::new_v4(), " \n ").is_err());
    }
}
