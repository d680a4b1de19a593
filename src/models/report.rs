//! Dashboard and report types

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::enums::{ItemCondition, LoanStatus, Role};
use super::loan::LoanDetails;
use super::return_record::ReturnDetails;
use crate::error::AppError;

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Dashboard {
    /// Active catalog items
    pub total_items: i64,
    pub total_quantity: i64,
    pub available_quantity: i64,
    pub active_loans: i64,
    pub overdue_loans: i64,
    pub returns_today: i64,
    pub active_users: i64,
    pub due_today: Vec<LoanDetails>,
    pub overdue: Vec<LoanDetails>,
    /// Loans issued per day, oldest first, days without loans included
    pub loans_last_7_days: Vec<DailyCount>,
}

/// Stock and population counters shared by the dashboard and the report summary
#[derive(Debug, Clone, Default, FromRow)]
pub struct InventoryCounts {
    pub total_items: i64,
    pub total_quantity: i64,
    pub available_quantity: i64,
    pub active_loans: i64,
    pub overdue_loans: i64,
    pub active_users: i64,
}

/// Expands sparse per-day counts into one entry per day of `start..start+days`
pub fn fill_daily_series(start: NaiveDate, days: i64, counts: &[DailyCount]) -> Vec<DailyCount> {
    (0..days)
        .map(|offset| {
            let date = start + Duration::days(offset);
            let count = counts
                .iter()
                .find(|c| c.date == date)
                .map(|c| c.count)
                .unwrap_or(0);
            DailyCount { date, count }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Report period query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ReportPeriodQuery {
    /// Defaults to the first day of the current month
    pub date_from: Option<NaiveDate>,
    /// Defaults to today
    pub date_to: Option<NaiveDate>,
}

/// Inclusive date range of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReportPeriod {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

impl ReportPeriod {
    pub fn resolve(query: &ReportPeriodQuery, today: NaiveDate) -> Result<Self, AppError> {
        let date_from = query.date_from.unwrap_or_else(|| first_day_of_month(today));
        let date_to = query.date_to.unwrap_or(today);
        if date_from > date_to {
            return Err(AppError::BadRequest(
                "date_from must not be after date_to".to_string(),
            ));
        }
        Ok(Self { date_from, date_to })
    }
}

fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportTotals {
    pub total_items: i64,
    pub total_quantity: i64,
    pub available_quantity: i64,
    pub active_loans: i64,
    pub overdue_loans: i64,
    pub active_users: i64,
    /// Loans issued within the period
    pub loans_in_period: i64,
    /// Returns recorded within the period
    pub returns_in_period: i64,
    #[schema(value_type = String)]
    pub fines_in_period: Decimal,
    pub fines_in_period_formatted: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct StatusCount {
    pub status: LoanStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BookLoanCount {
    pub item_id: i32,
    pub barcode: String,
    pub title: String,
    pub author: Option<String>,
    pub loan_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BorrowerLoanCount {
    pub user_id: i32,
    pub username: String,
    pub full_name: String,
    pub loan_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct MonthlyCount {
    /// `YYYY-MM`
    pub month: String,
    pub loans: i64,
    pub returns: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CategoryCount {
    pub category_id: Option<i32>,
    pub category_name: String,
    pub item_count: i64,
    pub total_quantity: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportSummary {
    pub period: ReportPeriod,
    pub totals: ReportTotals,
    pub loans_by_status: Vec<StatusCount>,
    pub top_books: Vec<BookLoanCount>,
    pub top_borrowers: Vec<BorrowerLoanCount>,
    pub monthly: Vec<MonthlyCount>,
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoanReport {
    pub period: ReportPeriod,
    pub loans: Vec<LoanDetails>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReturnReport {
    pub period: ReportPeriod,
    pub returns: Vec<ReturnDetails>,
    #[schema(value_type = String)]
    pub total_fines: Decimal,
    pub total_fines_formatted: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BookReportRow {
    pub id: i32,
    pub barcode: String,
    pub title: String,
    pub author: Option<String>,
    pub category_name: Option<String>,
    pub supplier_name: Option<String>,
    pub quantity_total: i32,
    pub quantity_available: i32,
    pub condition: ItemCondition,
    pub loan_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct UserReportRow {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub loan_count: i64,
    pub active_loan_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_defaults_to_month_to_date() {
        let period = ReportPeriod::resolve(&ReportPeriodQuery::default(), date(2024, 5, 17)).unwrap();
        assert_eq!(period.date_from, date(2024, 5, 1));
        assert_eq!(period.date_to, date(2024, 5, 17));
    }

    #[test]
    fn test_period_inverted_range_rejected() {
        let query = ReportPeriodQuery {
            date_from: Some(date(2024, 6, 1)),
            date_to: Some(date(2024, 5, 1)),
        };
        assert!(matches!(
            ReportPeriod::resolve(&query, date(2024, 6, 10)),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_daily_series_zero_fills_missing_days() {
        let start = date(2024, 2, 26);
        let counts = vec![
            DailyCount { date: date(2024, 2, 27), count: 3 },
            DailyCount { date: date(2024, 3, 1), count: 1 },
        ];
        let series = fill_daily_series(start, 7, &counts);

        assert_eq!(series.len(), 7);
        assert_eq!(series[0].date, start);
        assert_eq!(series[0].count, 0);
        assert_eq!(series[1].count, 3);
        // 2024 is a leap year
        assert_eq!(series[3].date, date(2024, 2, 29));
        assert_eq!(series[4].count, 1);
        assert_eq!(series[6].date, date(2024, 3, 3));
    }
}
