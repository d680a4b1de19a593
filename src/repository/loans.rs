//! Loans repository for database operations

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::LoanStatus,
        loan::{Loan, LoanDetails, LoanQuery, LoanRow},
        pagination::Pagination,
    },
};

const LOAN_COLUMNS: &str = r#"
    id, loan_code, user_id, item_id, loan_date, due_date, return_date,
    status, notes, created_at, updated_at
"#;

/// Joined loan select; `$today` is the placeholder holding the reference date
/// used to compute `late_days` of open loans.
fn loan_select(today: &str) -> String {
    format!(
        r#"
        SELECT l.id, l.loan_code, l.loan_date, l.due_date, l.return_date, l.status, l.notes,
               l.created_at,
               GREATEST(0, COALESCE(l.return_date, {today}::DATE) - l.due_date)::INT AS late_days,
               u.id AS user_id, u.username, u.full_name,
               i.id AS item_id, i.barcode, i.title, i.author
        FROM loans l
        JOIN users u ON u.id = l.user_id
        JOIN items i ON i.id = l.item_id
        "#,
        today = today
    )
}

const MAX_CODE_ATTEMPTS: usize = 10;

/// Loan to be inserted
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub user_id: i32,
    pub item_id: i32,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(&format!("SELECT {} FROM loans WHERE id = $1", LOAN_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Get loan with borrower and item
    pub async fn get_details(&self, id: i32, today: NaiveDate) -> AppResult<LoanDetails> {
        sqlx::query_as::<_, LoanRow>(&format!("{} WHERE l.id = $2", loan_select("$1")))
            .bind(today)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LoanDetails::from)
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Search loans with pagination, newest first
    pub async fn search(
        &self,
        query: &LoanQuery,
        today: NaiveDate,
        pagination: Pagination,
    ) -> AppResult<(Vec<LoanDetails>, i64)> {
        let pattern = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()));

        let filter = r#"
            WHERE ($1::TEXT IS NULL
                   OR LOWER(l.loan_code) LIKE $1
                   OR LOWER(u.username) LIKE $1
                   OR LOWER(u.full_name) LIKE $1
                   OR LOWER(i.title) LIKE $1
                   OR LOWER(i.barcode) LIKE $1)
              AND ($2::TEXT IS NULL OR l.status = $2)
              AND ($3::INT IS NULL OR l.user_id = $3)
              AND ($4::INT IS NULL OR l.item_id = $4)
        "#;

        let total: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COUNT(*)
            FROM loans l
            JOIN users u ON u.id = l.user_id
            JOIN items i ON i.id = l.item_id
            {}
            "#,
            filter
        ))
        .bind(&pattern)
        .bind(query.status)
        .bind(query.user_id)
        .bind(query.item_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            "{} {} ORDER BY l.created_at DESC, l.id DESC LIMIT $6 OFFSET $7",
            loan_select("$5"),
            filter
        ))
        .bind(&pattern)
        .bind(query.status)
        .bind(query.user_id)
        .bind(query.item_id)
        .bind(today)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(LoanDetails::from).collect(), total))
    }

    /// All loans of an item, newest first
    pub async fn list_for_item(&self, item_id: i32, today: NaiveDate) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            "{} WHERE l.item_id = $2 ORDER BY l.loan_date DESC, l.id DESC",
            loan_select("$1")
        ))
        .bind(today)
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LoanDetails::from).collect())
    }

    /// Open loans due on the given date
    pub async fn list_due_on(&self, date: NaiveDate) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            r#"
            {} WHERE l.status IN ('borrowed', 'overdue') AND l.due_date = $1
            ORDER BY u.full_name, l.id
            "#,
            loan_select("$1")
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LoanDetails::from).collect())
    }

    /// Open loans past their due date, most late first
    pub async fn list_overdue(&self, today: NaiveDate, limit: i64) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            r#"
            {} WHERE l.status IN ('borrowed', 'overdue') AND l.due_date < $1
            ORDER BY l.due_date, l.id
            LIMIT $2
            "#,
            loan_select("$1")
        ))
        .bind(today)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LoanDetails::from).collect())
    }

    /// Loans issued within an inclusive date range
    pub async fn list_issued_between(
        &self,
        date_from: NaiveDate,
        date_to: NaiveDate,
        today: NaiveDate,
    ) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            r#"
            {} WHERE l.loan_date BETWEEN $2 AND $3
            ORDER BY l.loan_date DESC, l.id DESC
            "#,
            loan_select("$1")
        ))
        .bind(today)
        .bind(date_from)
        .bind(date_to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LoanDetails::from).collect())
    }

    /// Issue a loan.
    ///
    /// In one transaction: checks borrower and item, takes one copy off the shelf
    /// and inserts the loan under the first free code produced by `next_code`.
    pub async fn create<F>(&self, loan: &NewLoan, mut next_code: F) -> AppResult<Loan>
    where
        F: FnMut() -> String,
    {
        let mut tx = self.pool.begin().await?;

        let user_active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM users WHERE id = $1 FOR SHARE")
                .bind(loan.user_id)
                .fetch_optional(&mut *tx)
                .await?;
        match user_active {
            None => {
                return Err(AppError::NotFound(format!("User with id {} not found", loan.user_id)))
            }
            Some(false) => {
                return Err(AppError::BusinessRule("User account is inactive".to_string()))
            }
            Some(true) => {}
        }

        let item_active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM items WHERE id = $1 FOR UPDATE")
                .bind(loan.item_id)
                .fetch_optional(&mut *tx)
                .await?;
        if item_active != Some(true) {
            return Err(AppError::NotFound(format!("Item with id {} not found", loan.item_id)));
        }

        let already_borrowed: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loans
                WHERE user_id = $1 AND item_id = $2 AND status IN ('borrowed', 'overdue')
            )
            "#,
        )
        .bind(loan.user_id)
        .bind(loan.item_id)
        .fetch_one(&mut *tx)
        .await?;
        if already_borrowed {
            return Err(AppError::Conflict(
                "User already has an active loan for this item".to_string(),
            ));
        }

        let taken = sqlx::query(
            r#"
            UPDATE items
            SET quantity_available = quantity_available - 1, updated_at = NOW()
            WHERE id = $1 AND quantity_available > 0
            "#,
        )
        .bind(loan.item_id)
        .execute(&mut *tx)
        .await?;
        if taken.rows_affected() == 0 {
            return Err(AppError::BusinessRule("Item is not available".to_string()));
        }

        let mut created = None;
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = next_code();
            let row = sqlx::query_as::<_, Loan>(&format!(
                r#"
                INSERT INTO loans (loan_code, user_id, item_id, loan_date, due_date, status, notes)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (loan_code) DO NOTHING
                RETURNING {}
                "#,
                LOAN_COLUMNS
            ))
            .bind(&code)
            .bind(loan.user_id)
            .bind(loan.item_id)
            .bind(loan.loan_date)
            .bind(loan.due_date)
            .bind(LoanStatus::Borrowed)
            .bind(&loan.notes)
            .fetch_optional(&mut *tx)
            .await?;

            if row.is_some() {
                created = row;
                break;
            }
            tracing::debug!("Loan code {} already in use, retrying", code);
        }

        let created = created.ok_or_else(|| {
            AppError::Internal("Could not allocate a unique loan code".to_string())
        })?;

        tx.commit().await?;
        Ok(created)
    }

    /// Update dates, notes and status of an open loan
    pub async fn update(
        &self,
        id: i32,
        loan_date: NaiveDate,
        due_date: NaiveDate,
        notes: Option<&str>,
        status: LoanStatus,
    ) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(&format!(
            r#"
            UPDATE loans
            SET loan_date = $2, due_date = $3, notes = $4, status = $5, updated_at = NOW()
            WHERE id = $1 AND status IN ('borrowed', 'overdue')
            RETURNING {}
            "#,
            LOAN_COLUMNS
        ))
        .bind(id)
        .bind(loan_date)
        .bind(due_date)
        .bind(notes)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::BusinessRule("Only active loans can be edited".to_string()))
    }

    /// Delete an open loan and put its copy back on the shelf
    pub async fn delete(&self, id: i32) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {} FROM loans WHERE id = $1 FOR UPDATE",
            LOAN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))?;

        if !loan.status.is_active() {
            return Err(AppError::BusinessRule(
                "Returned or lost loans cannot be deleted".to_string(),
            ));
        }

        sqlx::query(
            r#"
            UPDATE items
            SET quantity_available = LEAST(quantity_available + 1, quantity_total), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(loan.item_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(loan)
    }

    /// Mark borrowed loans past their due date as overdue; returns the number updated
    pub async fn sweep_overdue(&self, today: NaiveDate) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET status = 'overdue', updated_at = NOW()
            WHERE status = 'borrowed' AND due_date < $1
            "#,
        )
        .bind(today)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
