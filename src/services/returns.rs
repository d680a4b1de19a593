//! Return processing service

use validator::Validate;

use super::activity::ActivityService;
use crate::{
    config::LibraryConfig,
    error::{AppError, AppResult},
    models::{
        activity::{actions, tables, ClientInfo},
        blank_to_none,
        enums::ReturnCondition,
        fine::format_currency,
        pagination::Pagination,
        return_record::{CreateReturn, ReturnDetails, ReturnReceipt, ReturnSummary},
        UserClaims,
    },
    repository::{returns::NewReturn, Repository},
};

#[derive(Clone)]
pub struct ReturnsService {
    repository: Repository,
    library: LibraryConfig,
    activity: ActivityService,
}

impl ReturnsService {
    pub fn new(repository: Repository, library: LibraryConfig, activity: ActivityService) -> Self {
        Self { repository, library, activity }
    }

    /// Close an open loan and charge the late fine
    pub async fn create_return(&self, data: CreateReturn, actor: &UserClaims, client: &ClientInfo) -> AppResult<ReturnReceipt> {
        data.validate()?;

        let new_return = NewReturn {
            loan_id: data.loan_id,
            return_date: data.return_date.unwrap_or_else(super::today),
            condition: data.condition,
            notes: blank_to_none(data.notes),
        };
        let record = self
            .repository
            .returns
            .create(&new_return, self.library.fine_per_day)
            .await?;
        let details = self.repository.returns.get_details(record.id).await?;

        let fine_formatted = format_currency(details.fine_amount, &self.library.currency_symbol);
        let message = return_message(&details, &fine_formatted);

        tracing::info!(
            "Loan {} returned ({}), {} day(s) late, fine {}",
            details.loan_code,
            details.condition,
            details.late_days,
            details.fine_amount
        );
        self.activity
            .record(
                Some(actor.user_id),
                client,
                actions::CREATE,
                Some(tables::RETURNS),
                Some(details.id),
                format!("Return of loan {}: {}", details.loan_code, message),
            )
            .await;

        Ok(ReturnReceipt {
            record: details,
            fine_formatted,
            message,
        })
    }

    /// Search returns; members only ever see their own
    pub async fn search_returns(
        &self,
        search: Option<&str>,
        claims: &UserClaims,
        pagination: Pagination,
    ) -> AppResult<(Vec<ReturnDetails>, i64)> {
        let user_id = (!claims.is_staff()).then_some(claims.user_id);
        self.repository.returns.search(search, user_id, pagination).await
    }

    pub async fn get_return(&self, id: i32, claims: &UserClaims) -> AppResult<ReturnDetails> {
        let record = self.repository.returns.get_details(id).await?;
        if !claims.is_staff() && record.user.id != claims.user_id {
            return Err(AppError::NotFound(format!("Return with id {} not found", id)));
        }
        Ok(record)
    }

    pub async fn summary(&self) -> AppResult<ReturnSummary> {
        let (returns_today, total_returns, total_fines) =
            self.repository.returns.summary(super::today()).await?;
        Ok(ReturnSummary {
            returns_today,
            total_returns,
            total_fines,
            total_fines_formatted: format_currency(total_fines, &self.library.currency_symbol),
        })
    }
}

fn return_message(details: &ReturnDetails, fine_formatted: &str) -> String {
    let mut message = if details.condition == ReturnCondition::Lost {
        format!("{} was reported lost", details.item.title)
    } else {
        format!("{} was returned", details.item.title)
    };
    if details.late_days > 0 {
        message.push_str(&format!(
            ", {} day(s) late. Fine: {}",
            details.late_days, fine_formatted
        ));
    } else {
        message.push_str(" on time");
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{item::ItemShort, user::UserShort};
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    fn details(condition: ReturnCondition, late_days: i32) -> ReturnDetails {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        ReturnDetails {
            id: 1,
            loan_id: 1,
            loan_code: "LN202403010001".to_string(),
            loan_date: date,
            due_date: date,
            return_date: date,
            condition,
            late_days,
            fine_amount: Decimal::from(late_days * 1000),
            notes: None,
            created_at: Utc::now(),
            user: UserShort {
                id: 2,
                username: "budi".to_string(),
                full_name: "Budi Santoso".to_string(),
            },
            item: ItemShort {
                id: 3,
                barcode: "BK000123".to_string(),
                title: "Laskar Pelangi".to_string(),
                author: None,
            },
        }
    }

    #[test]
    fn test_message_on_time() {
        let message = return_message(&details(ReturnCondition::Good, 0), "Rp 0");
        assert_eq!(message, "Laskar Pelangi was returned on time");
    }

    #[test]
    fn test_message_late_includes_fine() {
        let message = return_message(&details(ReturnCondition::MinorDamage, 3), "Rp 3.000");
        assert_eq!(message, "Laskar Pelangi was returned, 3 day(s) late. Fine: Rp 3.000");
    }

    #[test]
    fn test_message_lost() {
        let message = return_message(&details(ReturnCondition::Lost, 0), "Rp 0");
        assert!(message.starts_with("Laskar Pelangi was reported lost"));
    }
}
