//! Return (loan closing) model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::enums::ReturnCondition;
use super::item::ItemShort;
use super::user::UserShort;

/// Return row as stored
#[derive(Debug, Clone, FromRow)]
pub struct ReturnRecord {
    pub id: i32,
    pub loan_id: i32,
    pub return_date: NaiveDate,
    pub condition: ReturnCondition,
    pub late_days: i32,
    pub fine_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Internal row structure for joined return queries
#[derive(Debug, Clone, FromRow)]
pub struct ReturnRow {
    id: i32,
    loan_id: i32,
    loan_code: String,
    loan_date: NaiveDate,
    due_date: NaiveDate,
    return_date: NaiveDate,
    condition: ReturnCondition,
    late_days: i32,
    fine_amount: Decimal,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    user_id: i32,
    username: String,
    full_name: String,
    item_id: i32,
    barcode: String,
    title: String,
    author: Option<String>,
}

impl From<ReturnRow> for ReturnDetails {
    fn from(row: ReturnRow) -> Self {
        ReturnDetails {
            id: row.id,
            loan_id: row.loan_id,
            loan_code: row.loan_code,
            loan_date: row.loan_date,
            due_date: row.due_date,
            return_date: row.return_date,
            condition: row.condition,
            late_days: row.late_days,
            fine_amount: row.fine_amount,
            notes: row.notes,
            created_at: row.created_at,
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

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReturnDetails {
    pub id: i32,
    pub loan_id: i32,
    pub loan_code: String,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: NaiveDate,
    pub condition: ReturnCondition,
    pub late_days: i32,
    #[schema(value_type = String)]
    pub fine_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user: UserShort,
    pub item: ItemShort,
}

/// Record a return request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReturn {
    pub loan_id: i32,
    /// Defaults to today
    pub return_date: Option<NaiveDate>,
    pub condition: ReturnCondition,
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

/// Result of recording a return
#[derive(Debug, Serialize, ToSchema)]
pub struct ReturnReceipt {
    #[serde(rename = "return")]
    pub record: ReturnDetails,
    /// Fine formatted in the library currency, e.g. `Rp 3.000`
    pub fine_formatted: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReturnSummary {
    pub returns_today: i64,
    pub total_returns: i64,
    #[schema(value_type = String)]
    pub total_fines: Decimal,
    pub total_fines_formatted: String,
}
