use chrono::NaiveDate;
use std::collections::HashMap;
use uuid::Uuid;

use super::GrievanceStatus;

/// How the `category` query parameter matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Numeric value: category id, or a name containing the digits
    IdOrName(i64, String),
    /// Case-insensitive substring of the category name
    Name(String),
}

/// Grievance list filters
///
/// Built leniently from query parameters: empty values are ignored, and
/// unparsable ids or dates drop the corresponding filter instead of failing
/// the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrievanceFilter {
    /// Case-insensitive status name
    pub status: Option<String>,
    pub category: Option<CategoryFilter>,
    pub assigned_officer: Option<Uuid>,
    /// Filer
    pub user: Option<Uuid>,
    /// Substring of title, description, tracking ID or filer names
    pub search: Option<String>,
    /// Inclusive, on the creation date
    pub date_from: Option<NaiveDate>,
    /// Inclusive, on the creation date
    pub date_to: Option<NaiveDate>,
}

/// Offset pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Rows returned when no limit is requested
    pub const DEFAULT_LIMIT: i64 = 100;
    pub const MAX_LIMIT: i64 = 200;

    /// `limit` of zero means the default; values above the maximum are clamped
    pub fn new(limit: i64, offset: i64) -> Self {
        let limit = if limit <= 0 {
            Self::DEFAULT_LIMIT
        } else {
            limit.min(Self::MAX_LIMIT)
        };
        Self {
            limit,
            offset: offset.max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

fn non_empty<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

impl GrievanceFilter {
    /// Parses filters and pagination from raw query parameters
    ///
    /// # Example
    /// ```
    /// use std::collections::HashMap;
    /// use grievance_portal_api::domain::grievance::filter::{GrievanceFilter, Page};
    ///
    /// let params: HashMap<String, String> = [
    ///     ("status".to_string(), "NEW".to_string()),
    ///     ("limit".to_string(), "abc".to_string()),
    /// ].into_iter().collect();
    ///
    /// let (filter, page) = GrievanceFilter::from_query(&params);
    /// assert_eq!(filter.status.as_deref(), Some("new"));
    /// assert_eq!(page, Page::new(0, 0));
    /// ```
    pub fn from_query(params: &HashMap<String, String>) -> (Self, Page) {
        let status = non_empty(params, "status").map(GrievanceStatus::normalize);

        let category = non_empty(params, "category").map(|value| {
            if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
                match value.parse::<i64>() {
                    Ok(id) => CategoryFilter::IdOrName(id, value.to_string()),
                    Err(_) => CategoryFilter::Name(value.to_string()),
                }
            } else {
                CategoryFilter::Name(value.to_string())
            }
        });

        let assigned_officer = ["assigned_officer", "assigned_to", "assigned"]
            .iter()
            .find_map(|key| non_empty(params, key))
            .and_then(|v| Uuid::parse_str(v).ok());

        let user = non_empty(params, "user").and_then(|v| Uuid::parse_str(v).ok());

        let search = non_empty(params, "search").map(str::to_string);

        let parse_date = |key: &str| {
            non_empty(params, key).and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
        };

        let filter = Self {
            status,
            category,
            assigned_officer,
            user,
            search,
            date_from: parse_date("date_from"),
            date_to: parse_date("date_to"),
        };

        let limit = non_empty(params, "limit").map(str::parse::<i64>);
        let offset = non_empty(params, "offset").map(str::parse::<i64>);
        let page = match (limit, offset) {
            (Some(Err(_)), _) | (_, Some(Err(_))) => Page::new(0, 0),
            (limit, offset) => Page::new(
                limit.and_then(Result::ok).unwrap_or(0),
                offset.and_then(Result::ok).unwrap_or(0),
            ),
        };

        (filter, page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_query_has_no_filters() {
        let (filter, page) = GrievanceFilter::from_query(&HashMap::new());
        assert_eq!(filter, GrievanceFilter::default());
        assert_eq!(page, Page { limit: 100, offset: 0 });
    }

    #[test]
    fn numeric_category_matches_id_or_name() {
        let (filter, _) = GrievanceFilter::from_query(&params(&[("category", "12")]));
        assert_eq!(
            filter.category,
            Some(CategoryFilter::IdOrName(12, "12".to_string()))
        );

        let (filter, _) = GrievanceFilter::from_query(&params(&[("category", " roads ")]));
        assert_eq!(filter.category, Some(CategoryFilter::Name("roads".to_string())));
    }

    #[test]
    fn assigned_officer_aliases() {
        let officer = Uuid::new_v4();
        for key in ["assigned_officer", "assigned_to", "assigned"] {
            let (filter, _) =
                GrievanceFilter::from_query(&params(&[(key, &officer.to_string())]));
            assert_eq!(filter.assigned_officer, Some(officer), "alias {}", key);
        }
    }

    #[test]
    fn invalid_ids_are_ignored() {
        let (filter, _) =
            GrievanceFilter::from_query(&params(&[("assigned_officer", "7"), ("user", "x")]));
        assert_eq!(filter.assigned_officer, None);
        assert_eq!(filter.user, None);
    }

    #[test]
    fn dates_parse_or_are_dropped() {
        let (filter, _) = GrievanceFilter::from_query(&params(&[
            ("date_from", "2026-01-31"),
            ("date_to", "31/01/2026"),
        ]));
        assert_eq!(filter.date_from, NaiveDate::from_ymd_opt(2026, 1, 31));
        assert_eq!(filter.date_to, None);
    }

    #[test]
    fn status_labels_normalize_like_status_parsing() {
        let (filter, _) = GrievanceFilter::from_query(&params(&[("status", " In Progress ")]));
        assert_eq!(filter.status.as_deref(), Some("in_progress"));
        assert_eq!(
            filter.status.as_deref().map(str::parse::<GrievanceStatus>),
            Some(Ok(GrievanceStatus::InProgress))
        );
    }

    #[test]
    fn blank_values_are_ignored() {
        let (filter, _) =
            GrievanceFilter::from_query(&params(&[("status", "  "), ("search", "")]));
        assert_eq!(filter.status, None);
        assert_eq!(filter.search, None);
    }

    #[test]
    fn pagination_rules() {
        let (_, page) = GrievanceFilter::from_query(&params(&[("limit", "20"), ("offset", "40")]));
        assert_eq!(page, Page { limit: 20, offset: 40 });

        let (_, page) = GrievanceFilter::from_query(&params(&[("limit", "5000")]));
        assert_eq!(page.limit, Page::MAX_LIMIT);

        let (_, page) = GrievanceFilter::from_query(&params(&[("limit", "10"), ("offset", "x")]));
        assert_eq!(page, Page { limit: 100, offset: 0 });

        let (_, page) = GrievanceFilter::from_query(&params(&[("offset", "-4")]));
        assert_eq!(page.offset, 0);
    }
}
