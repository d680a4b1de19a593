//! Activity log model

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Action names written to the activity log
pub mod actions {
    pub const LOGIN: &str = "login";
    pub const LOGIN_FAILED: &str = "login_failed";
    pub const LOGOUT: &str = "logout";
    pub const REGISTER: &str = "register";
    pub const PASSWORD_RESET_REQUEST: &str = "password_reset_request";
    pub const PASSWORD_RESET: &str = "password_reset";
    pub const UPDATE_PROFILE: &str = "update_profile";
    pub const CREATE: &str = "create";
    pub const UPDATE: &str = "update";
    pub const DELETE: &str = "delete";
}

/// Table names written to `table_affected`
pub mod tables {
    pub const USERS: &str = "users";
    pub const CATEGORIES: &str = "categories";
    pub const SUPPLIERS: &str = "suppliers";
    pub const ITEMS: &str = "items";
    pub const LOANS: &str = "loans";
    pub const RETURNS: &str = "returns";
}

/// Requesting client, captured from the HTTP request
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Activity entry to be written
#[derive(Debug, Clone)]
pub struct NewActivity<'a> {
    pub user_id: Option<i32>,
    pub action: &'a str,
    pub table_affected: Option<&'a str>,
    pub record_id: Option<i32>,
    pub description: String,
}

/// Activity log entry with the acting user's name
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ActivityEntry {
    pub id: i64,
    pub user_id: Option<i32>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub action: String,
    pub table_affected: Option<String>,
    pub record_id: Option<i32>,
    pub description: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Activity log query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ActivityQuery {
    /// Search in action, description, username and full name
    pub search: Option<String>,
    pub user_id: Option<i32>,
    pub action: Option<String>,
    /// Inclusive
    pub date_from: Option<NaiveDate>,
    /// Inclusive
    pub date_to: Option<NaiveDate>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ActivityQuery {
    /// Inclusive local dates as a half-open `[from, to + 1 day)` instant range
    pub fn created_range(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        (
            self.date_from.map(local_day_start),
            self.date_to.and_then(|d| d.succ_opt()).map(local_day_start),
        )
    }
}

/// Local midnight of `date` as an instant
pub fn local_day_start(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::default());
    match Local.from_local_datetime(&midnight).earliest() {
        Some(start) => start.with_timezone(&Utc),
        // Midnight skipped by a DST change
        None => Utc.from_utc_datetime(&midnight),
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivitySummary {
    pub activities_today: i64,
    /// Distinct users with at least one logged activity
    pub active_users: i64,
    pub failed_logins: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_start_is_local_midnight() {
        let start = local_day_start(date(2024, 5, 17)).with_timezone(&Local);
        assert_eq!(start.date_naive(), date(2024, 5, 17));
        assert_eq!(start.time(), NaiveTime::default());
    }

    #[test]
    fn test_created_range_includes_whole_end_day() {
        let query = ActivityQuery {
            date_from: Some(date(2024, 5, 1)),
            date_to: Some(date(2024, 5, 31)),
            ..Default::default()
        };
        let (from, to) = query.created_range();
        assert_eq!(from, Some(local_day_start(date(2024, 5, 1))));
        assert_eq!(to, Some(local_day_start(date(2024, 6, 1))));

        assert_eq!(ActivityQuery::default().created_range(), (None, None));
    }
}
