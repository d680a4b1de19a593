//! Returns repository for database operations

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{LoanStatus, ReturnCondition},
        fine::{fine_for, late_days},
        loan::Loan,
        pagination::Pagination,
        return_record::{ReturnDetails, ReturnRecord, ReturnRow},
    },
};

const RETURN_SELECT: &str = r#"
    SELECT r.id, r.loan_id, l.loan_code, l.loan_date, l.due_date, r.return_date,
           r.condition, r.late_days, r.fine_amount, r.notes, r.created_at,
           u.id AS user_id, u.username, u.full_name,
           i.id AS item_id, i.barcode, i.title, i.author
    FROM returns r
    JOIN loans l ON l.id = r.loan_id
    JOIN users u ON u.id = l.user_id
    JOIN items i ON i.id = l.item_id
"#;

/// Return to be recorded
#[derive(Debug, Clone)]
pub struct NewReturn {
    pub loan_id: i32,
    pub return_date: NaiveDate,
    pub condition: ReturnCondition,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct ReturnsRepository {
    pool: Pool<Postgres>,
}

impl ReturnsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_details(&self, id: i32) -> AppResult<ReturnDetails> {
        sqlx::query_as::<_, ReturnRow>(&format!("{} WHERE r.id = $1", RETURN_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(ReturnDetails::from)
            .ok_or_else(|| AppError::NotFound(format!("Return with id {} not found", id)))
    }

    /// Search returns, most recent return first
    pub async fn search(
        &self,
        search: Option<&str>,
        user_id: Option<i32>,
        pagination: Pagination,
    ) -> AppResult<(Vec<ReturnDetails>, i64)> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()));

        let filter = r#"
            WHERE ($1::TEXT IS NULL
                   OR LOWER(l.loan_code) LIKE $1
                   OR LOWER(u.username) LIKE $1
                   OR LOWER(u.full_name) LIKE $1
                   OR LOWER(i.title) LIKE $1)
              AND ($2::INT IS NULL OR l.user_id = $2)
        "#;

        let total: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COUNT(*)
            FROM returns r
            JOIN loans l ON l.id = r.loan_id
            JOIN users u ON u.id = l.user_id
            JOIN items i ON i.id = l.item_id
            {}
            "#,
            filter
        ))
        .bind(&pattern)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ReturnRow>(&format!(
            "{} {} ORDER BY r.return_date DESC, r.id DESC LIMIT $3 OFFSET $4",
            RETURN_SELECT, filter
        ))
        .bind(&pattern)
        .bind(user_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(ReturnDetails::from).collect(), total))
    }

    /// Returns recorded within an inclusive date range
    pub async fn list_between(&self, date_from: NaiveDate, date_to: NaiveDate) -> AppResult<Vec<ReturnDetails>> {
        let rows = sqlx::query_as::<_, ReturnRow>(&format!(
            "{} WHERE r.return_date BETWEEN $1 AND $2 ORDER BY r.return_date DESC, r.id DESC",
            RETURN_SELECT
        ))
        .bind(date_from)
        .bind(date_to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ReturnDetails::from).collect())
    }

    /// Close an open loan.
    ///
    /// In one transaction: locks the loan, computes late days and fine, closes
    /// the loan, adjusts the item stock and inserts the return record.
    pub async fn create(&self, data: &NewReturn, fine_per_day: Decimal) -> AppResult<ReturnRecord> {
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            SELECT id, loan_code, user_id, item_id, loan_date, due_date, return_date,
                   status, notes, created_at, updated_at
            FROM loans
            WHERE id = $1 AND status IN ('borrowed', 'overdue')
            FOR UPDATE
            "#,
        )
        .bind(data.loan_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Loan not found or already returned".to_string()))?;

        if data.return_date < loan.loan_date {
            return Err(AppError::Validation(
                "Return date cannot be before the loan date".to_string(),
            ));
        }

        let days = late_days(loan.due_date, data.return_date);
        let fine = fine_for(days, fine_per_day);
        let closing_status: LoanStatus = data.condition.closing_status();

        sqlx::query(
            r#"
            UPDATE loans SET status = $2, return_date = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(loan.id)
        .bind(closing_status)
        .bind(data.return_date)
        .execute(&mut *tx)
        .await?;

        if data.condition == ReturnCondition::Lost {
            // The copy never comes back: it leaves the stock for good
            sqlx::query(
                r#"
                UPDATE items
                SET quantity_total = GREATEST(quantity_total - 1, quantity_available, 0),
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(loan.item_id)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(
                r#"
                UPDATE items
                SET quantity_available = LEAST(quantity_available + 1, quantity_total),
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(loan.item_id)
            .execute(&mut *tx)
            .await?;
        }

        let record = sqlx::query_as::<_, ReturnRecord>(
            r#"
            INSERT INTO returns (loan_id, return_date, condition, late_days, fine_amount, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, loan_id, return_date, condition, late_days, fine_amount, notes, created_at
            "#,
        )
        .bind(loan.id)
        .bind(data.return_date)
        .bind(data.condition)
        .bind(days as i32)
        .bind(fine)
        .bind(&data.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(record)
    }

    /// (returns on `today`, all returns, all fines)
    pub async fn summary(&self, today: NaiveDate) -> AppResult<(i64, i64, Decimal)> {
        let row: (i64, i64, Decimal) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE return_date = $1),
                   COUNT(*),
                   COALESCE(SUM(fine_amount), 0)
            FROM returns
            "#,
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
