//! Query-string handling for history reads.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::error::ApiError;

pub const DEFAULT_WINDOW_DAYS: i64 = 60;

/// The raw `siteId` / `days` query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    pub site_id: Option<String>,
    pub days: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct HistoryQuery {
    pub site_id: Option<String>,
    #[validate(range(min = 0, max = 36500))]
    pub days: i64,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            site_id: None,
            days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl HistoryQuery {
    pub fn from_params(params: HistoryParams) -> Result<Self, ApiError> {
        let days = match params.days.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_WINDOW_DAYS,
            Some(days) => days
                .parse()
                .map_err(|_| ApiError::InvalidQuery(format!("days must be an integer, got {days:?}")))?,
        };

        let query = Self {
            site_id: params.site_id.filter(|id| !id.is_empty()),
            days,
        };
        query
            .validate()
            .map_err(|_| ApiError::InvalidQuery(format!("days must be between 0 and 36500, got {days}")))?;

        Ok(query)
    }

    /// Lower bound of the window, inclusive.
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(site_id: Option<&str>, days: Option<&str>) -> HistoryParams {
        HistoryParams {
            site_id: site_id.map(str::to_string),
            days: days.map(str::to_string),
        }
    }

    #[test]
    fn defaults_to_sixty_days_for_every_site() {
        let query = HistoryQuery::from_params(HistoryParams::default()).unwrap();
        assert_eq!(query, HistoryQuery::default());
        assert_eq!(query.days, 60);
        assert_eq!(query.site_id, None);
    }

    #[test]
    fn empty_values_mean_absent() {
        let query = HistoryQuery::from_params(params(Some(""), Some(""))).unwrap();
        assert_eq!(query, HistoryQuery::default());
    }

    #[test]
    fn keeps_site_and_days() {
        let query = HistoryQuery::from_params(params(Some("a"), Some("30"))).unwrap();
        assert_eq!(query.site_id.as_deref(), Some("a"));
        assert_eq!(query.days, 30);
    }

    #[test]
    fn rejects_malformed_days() {
        for days in ["abc", "1.5", "-1", "99999"] {
            let err = HistoryQuery::from_params(params(None, Some(days))).unwrap_err();
            assert!(matches!(err, ApiError::InvalidQuery(_)), "{days} accepted");
        }
    }

    #[test]
    fn window_bound_is_now_minus_days() {
        let now = Utc::now();
        let query = HistoryQuery {
            site_id: None,
            days: 30,
        };
        assert_eq!(now - query.since(now), Duration::days(30));

        let empty = HistoryQuery { days: 0, ..query };
        assert_eq!(empty.since(now), now);
    }
}
