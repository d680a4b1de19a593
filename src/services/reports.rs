//! Dashboard and reporting service

use chrono::Duration;
use rust_decimal::Decimal;

use crate::{
    config::LibraryConfig,
    error::AppResult,
    models::{
        fine::format_currency,
        report::{
            fill_daily_series, BookReportRow, Dashboard, LoanReport, ReportPeriod,
            ReportPeriodQuery, ReportSummary, ReportTotals, ReturnReport, UserReportRow,
        },
    },
    repository::Repository,
};

const TOP_LIMIT: i64 = 10;
const DASHBOARD_OVERDUE_LIMIT: i64 = 10;
const CHART_DAYS: i64 = 7;

#[derive(Clone)]
pub struct ReportsService {
    repository: Repository,
    library: LibraryConfig,
}

impl ReportsService {
    pub fn new(repository: Repository, library: LibraryConfig) -> Self {
        Self { repository, library }
    }

    pub async fn dashboard(&self) -> AppResult<Dashboard> {
        let today = super::today();
        self.repository.loans.sweep_overdue(today).await?;

        let counts = self.repository.reports.inventory_counts().await?;
        let returns_today = self.repository.reports.returns_on(today).await?;
        let due_today = self.repository.loans.list_due_on(today).await?;
        let overdue = self
            .repository
            .loans
            .list_overdue(today, DASHBOARD_OVERDUE_LIMIT)
            .await?;

        let start = today - Duration::days(CHART_DAYS - 1);
        let daily = self.repository.reports.daily_loan_counts(start, today).await?;

        Ok(Dashboard {
            total_items: counts.total_items,
            total_quantity: counts.total_quantity,
            available_quantity: counts.available_quantity,
            active_loans: counts.active_loans,
            overdue_loans: counts.overdue_loans,
            returns_today,
            active_users: counts.active_users,
            due_today,
            overdue,
            loans_last_7_days: fill_daily_series(start, CHART_DAYS, &daily),
        })
    }

    pub async fn summary(&self, query: &ReportPeriodQuery) -> AppResult<ReportSummary> {
        let period = ReportPeriod::resolve(query, super::today())?;
        let (from, to) = (period.date_from, period.date_to);
        let reports = &self.repository.reports;

        let counts = reports.inventory_counts().await?;
        let (loans_in_period, returns_in_period, fines_in_period) = reports.period_totals(from, to).await?;

        Ok(ReportSummary {
            period,
            totals: ReportTotals {
                total_items: counts.total_items,
                total_quantity: counts.total_quantity,
                available_quantity: counts.available_quantity,
                active_loans: counts.active_loans,
                overdue_loans: counts.overdue_loans,
                active_users: counts.active_users,
                loans_in_period,
                returns_in_period,
                fines_in_period,
                fines_in_period_formatted: format_currency(fines_in_period, &self.library.currency_symbol),
            },
            loans_by_status: reports.loans_by_status(from, to).await?,
            top_books: reports.top_books(from, to, TOP_LIMIT).await?,
            top_borrowers: reports.top_borrowers(from, to, TOP_LIMIT).await?,
            monthly: reports.monthly_counts(from, to).await?,
            categories: reports.category_distribution().await?,
        })
    }

    pub async fn loans(&self, query: &ReportPeriodQuery) -> AppResult<LoanReport> {
        let today = super::today();
        let period = ReportPeriod::resolve(query, today)?;
        let loans = self
            .repository
            .loans
            .list_issued_between(period.date_from, period.date_to, today)
            .await?;
        Ok(LoanReport { period, loans })
    }

    pub async fn returns(&self, query: &ReportPeriodQuery) -> AppResult<ReturnReport> {
        let period = ReportPeriod::resolve(query, super::today())?;
        let returns = self
            .repository
            .returns
            .list_between(period.date_from, period.date_to)
            .await?;
        let total_fines: Decimal = returns.iter().map(|r| r.fine_amount).sum();

        Ok(ReturnReport {
            period,
            returns,
            total_fines,
            total_fines_formatted: format_currency(total_fines, &self.library.currency_symbol),
        })
    }

    pub async fn books(&self) -> AppResult<Vec<BookReportRow>> {
        self.repository.reports.books().await
    }

    pub async fn users(&self) -> AppResult<Vec<UserReportRow>> {
        self.repository.reports.users().await
    }
}
