//! Aggregate queries behind the dashboard and reports

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::report::{
        BookLoanCount, BookReportRow, BorrowerLoanCount, CategoryCount, DailyCount,
        InventoryCounts, MonthlyCount, StatusCount, UserReportRow,
    },
};

#[derive(Clone)]
pub struct ReportsRepository {
    pool: Pool<Postgres>,
}

impl ReportsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Current stock, open loans and active accounts
    pub async fn inventory_counts(&self) -> AppResult<InventoryCounts> {
        let counts = sqlx::query_as::<_, InventoryCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM items WHERE is_active) AS total_items,
                (SELECT COALESCE(SUM(quantity_total), 0)::BIGINT FROM items WHERE is_active) AS total_quantity,
                (SELECT COALESCE(SUM(quantity_available), 0)::BIGINT FROM items WHERE is_active) AS available_quantity,
                (SELECT COUNT(*) FROM loans WHERE status IN ('borrowed', 'overdue')) AS active_loans,
                (SELECT COUNT(*) FROM loans WHERE status = 'overdue') AS overdue_loans,
                (SELECT COUNT(*) FROM users WHERE is_active) AS active_users
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    pub async fn returns_on(&self, date: NaiveDate) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM returns WHERE return_date = $1")
            .bind(date)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Loans issued per day in the range; days without loans are absent
    pub async fn daily_loan_counts(&self, date_from: NaiveDate, date_to: NaiveDate) -> AppResult<Vec<DailyCount>> {
        let counts = sqlx::query_as::<_, DailyCount>(
            r#"
            SELECT loan_date AS date, COUNT(*) AS count
            FROM loans
            WHERE loan_date BETWEEN $1 AND $2
            GROUP BY loan_date
            ORDER BY loan_date
            "#,
        )
        .bind(date_from)
        .bind(date_to)
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    /// (loans issued, returns recorded, fines charged) within the range
    pub async fn period_totals(&self, date_from: NaiveDate, date_to: NaiveDate) -> AppResult<(i64, i64, Decimal)> {
        let totals: (i64, i64, Decimal) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM loans WHERE loan_date BETWEEN $1 AND $2),
                (SELECT COUNT(*) FROM returns WHERE return_date BETWEEN $1 AND $2),
                (SELECT COALESCE(SUM(fine_amount), 0) FROM returns WHERE return_date BETWEEN $1 AND $2)
            "#,
        )
        .bind(date_from)
        .bind(date_to)
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }

    pub async fn loans_by_status(&self, date_from: NaiveDate, date_to: NaiveDate) -> AppResult<Vec<StatusCount>> {
        let counts = sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM loans
            WHERE loan_date BETWEEN $1 AND $2
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(date_from)
        .bind(date_to)
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    pub async fn top_books(&self, date_from: NaiveDate, date_to: NaiveDate, limit: i64) -> AppResult<Vec<BookLoanCount>> {
        let books = sqlx::query_as::<_, BookLoanCount>(
            r#"
            SELECT i.id AS item_id, i.barcode, i.title, i.author, COUNT(l.id) AS loan_count
            FROM loans l
            JOIN items i ON i.id = l.item_id
            WHERE l.loan_date BETWEEN $1 AND $2
            GROUP BY i.id, i.barcode, i.title, i.author
            ORDER BY loan_count DESC, i.title
            LIMIT $3
            "#,
        )
        .bind(date_from)
        .bind(date_to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    pub async fn top_borrowers(&self, date_from: NaiveDate, date_to: NaiveDate, limit: i64) -> AppResult<Vec<BorrowerLoanCount>> {
        let users = sqlx::query_as::<_, BorrowerLoanCount>(
            r#"
            SELECT u.id AS user_id, u.username, u.full_name, COUNT(l.id) AS loan_count
            FROM loans l
            JOIN users u ON u.id = l.user_id
            WHERE l.loan_date BETWEEN $1 AND $2
            GROUP BY u.id, u.username, u.full_name
            ORDER BY loan_count DESC, u.full_name
            LIMIT $3
            "#,
        )
        .bind(date_from)
        .bind(date_to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// Loan and return counts per `YYYY-MM` month touching the range
    pub async fn monthly_counts(&self, date_from: NaiveDate, date_to: NaiveDate) -> AppResult<Vec<MonthlyCount>> {
        let months = sqlx::query_as::<_, MonthlyCount>(
            r#"
            WITH loan_months AS (
                SELECT TO_CHAR(loan_date, 'YYYY-MM') AS month, COUNT(*) AS loans
                FROM loans
                WHERE loan_date BETWEEN $1 AND $2
                GROUP BY 1
            ),
            return_months AS (
                SELECT TO_CHAR(return_date, 'YYYY-MM') AS month, COUNT(*) AS returns
                FROM returns
                WHERE return_date BETWEEN $1 AND $2
                GROUP BY 1
            )
            SELECT COALESCE(lm.month, rm.month) AS month,
                   COALESCE(lm.loans, 0) AS loans,
                   COALESCE(rm.returns, 0) AS returns
            FROM loan_months lm
            FULL OUTER JOIN return_months rm ON rm.month = lm.month
            ORDER BY 1
            "#,
        )
        .bind(date_from)
        .bind(date_to)
        .fetch_all(&self.pool)
        .await?;
        Ok(months)
    }

    /// Active items per category; uncategorized items are grouped under "-"
    pub async fn category_distribution(&self) -> AppResult<Vec<CategoryCount>> {
        let categories = sqlx::query_as::<_, CategoryCount>(
            r#"
            SELECT c.id AS category_id,
                   COALESCE(c.name, '-') AS category_name,
                   COUNT(i.id) AS item_count,
                   COALESCE(SUM(i.quantity_total), 0)::BIGINT AS total_quantity
            FROM items i
            LEFT JOIN categories c ON c.id = i.category_id
            WHERE i.is_active
            GROUP BY c.id, c.name
            ORDER BY item_count DESC, category_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn books(&self) -> AppResult<Vec<BookReportRow>> {
        let rows = sqlx::query_as::<_, BookReportRow>(
            r#"
            SELECT i.id, i.barcode, i.title, i.author,
                   c.name AS category_name, s.name AS supplier_name,
                   i.quantity_total, i.quantity_available, i.condition,
                   (SELECT COUNT(*) FROM loans l WHERE l.item_id = i.id) AS loan_count
            FROM items i
            LEFT JOIN categories c ON c.id = i.category_id
            LEFT JOIN suppliers s ON s.id = i.supplier_id
            WHERE i.is_active
            ORDER BY i.title, i.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn users(&self) -> AppResult<Vec<UserReportRow>> {
        let rows = sqlx::query_as::<_, UserReportRow>(
            r#"
            SELECT u.id, u.username, u.full_name, u.email, u.role, u.is_active,
                   COUNT(l.id) AS loan_count,
                   COUNT(l.id) FILTER (WHERE l.status IN ('borrowed', 'overdue')) AS active_loan_count
            FROM users u
            LEFT JOIN loans l ON l.user_id = u.id
            GROUP BY u.id
            ORDER BY u.full_name, u.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
