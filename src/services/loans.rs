//! Loan management service

use chrono::Duration;
use validator::Validate;

use super::{activity::ActivityService, codes::generate_loan_code};
use crate::{
    config::LibraryConfig,
    error::{AppError, AppResult},
    models::{
        activity::{actions, tables, ClientInfo},
        blank_to_none,
        loan::{status_for_due_date, CreateLoan, LoanDetails, LoanQuery, UpdateLoan},
        pagination::Pagination,
        UserClaims,
    },
    repository::{loans::NewLoan, Repository},
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    library: LibraryConfig,
    activity: ActivityService,
}

impl LoansService {
    pub fn new(repository: Repository, library: LibraryConfig, activity: ActivityService) -> Self {
        Self { repository, library, activity }
    }

    /// Mark borrowed loans past their due date as overdue
    pub async fn sweep_overdue(&self) -> AppResult<u64> {
        let updated = self.repository.loans.sweep_overdue(super::today()).await?;
        if updated > 0 {
            tracing::info!("{} loan(s) marked overdue", updated);
        }
        Ok(updated)
    }

    /// Search loans; members only ever see their own
    pub async fn search_loans(
        &self,
        mut query: LoanQuery,
        claims: &UserClaims,
        pagination: Pagination,
    ) -> AppResult<(Vec<LoanDetails>, i64)> {
        if !claims.is_staff() {
            query.user_id = Some(claims.user_id);
        }
        self.sweep_overdue().await?;
        self.repository
            .loans
            .search(&query, super::today(), pagination)
            .await
    }

    pub async fn get_loan(&self, id: i32, claims: &UserClaims) -> AppResult<LoanDetails> {
        let loan = self.repository.loans.get_details(id, super::today()).await?;
        if !claims.is_staff() && loan.user.id != claims.user_id {
            // Same answer as a missing loan
            return Err(AppError::NotFound(format!("Loan with id {} not found", id)));
        }
        Ok(loan)
    }

    /// Issue a loan
    pub async fn create_loan(&self, data: CreateLoan, actor: &UserClaims, client: &ClientInfo) -> AppResult<LoanDetails> {
        data.validate()?;

        let today = super::today();
        let loan_date = data.loan_date.unwrap_or(today);
        let due_date = data
            .due_date
            .unwrap_or(loan_date + Duration::days(self.library.default_loan_days));
        if due_date < loan_date {
            return Err(AppError::Validation(
                "Due date cannot be before the loan date".to_string(),
            ));
        }

        let new_loan = NewLoan {
            user_id: data.user_id,
            item_id: data.item_id,
            loan_date,
            due_date,
            notes: blank_to_none(data.notes),
        };
        let loan = self
            .repository
            .loans
            .create(&new_loan, || generate_loan_code(loan_date, &mut rand::thread_rng()))
            .await?;

        // A backdated loan can already be late
        if due_date < today {
            self.repository.loans.sweep_overdue(today).await?;
        }

        let details = self.repository.loans.get_details(loan.id, today).await?;

        tracing::info!(
            "Loan {} issued: item {} to user {} until {}",
            details.loan_code,
            details.item.id,
            details.user.id,
            details.due_date
        );
        self.activity
            .record(
                Some(actor.user_id),
                client,
                actions::CREATE,
                Some(tables::LOANS),
                Some(details.id),
                format!(
                    "Loan {}: {} borrowed by {}",
                    details.loan_code, details.item.title, details.user.full_name
                ),
            )
            .await;

        Ok(details)
    }

    /// Change dates or notes of an open loan
    pub async fn update_loan(&self, id: i32, data: UpdateLoan, actor: &UserClaims, client: &ClientInfo) -> AppResult<LoanDetails> {
        data.validate()?;

        let current = self.repository.loans.get_by_id(id).await?;
        if !current.status.is_active() {
            return Err(AppError::BusinessRule("Only active loans can be edited".to_string()));
        }

        let loan_date = data.loan_date.unwrap_or(current.loan_date);
        let due_date = data.due_date.unwrap_or(current.due_date);
        if due_date < loan_date {
            return Err(AppError::Validation(
                "Due date cannot be before the loan date".to_string(),
            ));
        }
        let notes = match data.notes {
            Some(notes) => blank_to_none(Some(notes)),
            None => current.notes,
        };

        let today = super::today();
        let status = status_for_due_date(current.status, due_date, today);
        self.repository
            .loans
            .update(id, loan_date, due_date, notes.as_deref(), status)
            .await?;

        let details = self.repository.loans.get_details(id, today).await?;

        self.activity
            .record(
                Some(actor.user_id),
                client,
                actions::UPDATE,
                Some(tables::LOANS),
                Some(id),
                format!("Updated loan {} (due {})", details.loan_code, details.due_date),
            )
            .await;

        Ok(details)
    }

    /// Cancel an open loan, restoring the item stock
    pub async fn delete_loan(&self, id: i32, actor: &UserClaims, client: &ClientInfo) -> AppResult<()> {
        let loan = self.repository.loans.delete(id).await?;

        tracing::info!("Loan {} deleted", loan.loan_code);
        self.activity
            .record(
                Some(actor.user_id),
                client,
                actions::DELETE,
                Some(tables::LOANS),
                Some(id),
                format!("Deleted loan {}", loan.loan_code),
            )
            .await;

        Ok(())
    }
}
