//! Loan model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::LoanStatus;
use super::item::ItemShort;
use super::user::UserShort;

/// Loan row as stored
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Loan {
    pub id: i32,
    pub loan_code: String,
    pub user_id: i32,
    pub item_id: i32,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: LoanStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Internal row structure for joined loan queries
#[derive(Debug, Clone, FromRow)]
pub struct LoanRow {
    id: i32,
    loan_code: String,
    loan_date: NaiveDate,
    due_date: NaiveDate,
    return_date: Option<NaiveDate>,
    status: LoanStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    late_days: i32,
    user_id: i32,
    username: String,
    full_name: String,
    item_id: i32,
    barcode: String,
    title: String,
    author: Option<String>,
}

impl From<LoanRow> for LoanDetails {
    fn from(row: LoanRow) -> Self {
        LoanDetails {
            id: row.id,
            loan_code: row.loan_code,
            loan_date: row.loan_date,
            due_date: row.due_date,
            return_date: row.return_date,
            status: row.status,
            notes: row.notes,
            created_at: row.created_at,
            late_days: i64::from(row.late_days),
            user: UserShort {
                id: row.user_id,
                username: row.username,
                full_name: row.full_name,
            },
            item: ItemShort {
                id: row.item_id,
                barcode: row.barcode,
                title: row.title,
                author: row.author,
            },
        }
    }
}

/// Loan with borrower and item for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub loan_code: String,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: LoanStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Days past the due date (as of today for open loans, as of the return otherwise)
    pub late_days: i64,
    pub user: UserShort,
    pub item: ItemShort,
}

/// Loan list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct LoanQuery {
    /// Search in loan code, username, full name, title and barcode
    pub search: Option<String>,
    pub status: Option<LoanStatus>,
    pub user_id: Option<i32>,
    pub item_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create loan request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLoan {
    pub user_id: i32,
    pub item_id: i32,
    /// Defaults to today
    pub loan_date: Option<NaiveDate>,
    /// Defaults to loan_date plus the configured loan length
    pub due_date: Option<NaiveDate>,
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

/// Update loan request; absent fields keep their current value
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLoan {
    pub loan_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

/// Status an active loan takes once its due date is (re)set.
///
/// Closed loans keep their status.
pub fn status_for_due_date(current: LoanStatus, due_date: NaiveDate, today: NaiveDate) -> LoanStatus {
    match current {
        LoanStatus::Borrowed | LoanStatus::Overdue if due_date < today => LoanStatus::Overdue,
        LoanStatus::Borrowed | LoanStatus::Overdue => LoanStatus::Borrowed,
        closed => closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_due_date_moved_into_past_marks_overdue() {
        let today = date(2024, 3, 10);
        assert_eq!(
            status_for_due_date(LoanStatus::Borrowed, date(2024, 3, 9), today),
            LoanStatus::Overdue
        );
    }

    #[test]
    fn test_due_date_extended_clears_overdue() {
        let today = date(2024, 3, 10);
        assert_eq!(
            status_for_due_date(LoanStatus::Overdue, today, today),
            LoanStatus::Borrowed
        );
        assert_eq!(
            status_for_due_date(LoanStatus::Overdue, date(2024, 3, 17), today),
            LoanStatus::Borrowed
        );
    }

    #[test]
    fn test_closed_loans_keep_status() {
        let today = date(2024, 3, 10);
        assert_eq!(
            status_for_due_date(LoanStatus::Returned, date(2024, 1, 1), today),
            LoanStatus::Returned
        );
        assert_eq!(
            status_for_due_date(LoanStatus::Lost, date(2024, 1, 1), today),
            LoanStatus::Lost
        );
    }
}
