//! Business logic services

pub mod activity;
pub mod auth;
pub mod catalog;
pub mod codes;
pub mod email;
pub mod loans;
pub mod redis;
pub mod reports;
pub mod returns;
pub mod suppliers;
pub mod users;

use chrono::NaiveDate;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Local calendar date used for due dates, overdue checks and fines
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
    pub suppliers: suppliers::SuppliersService,
    pub loans: loans::LoansService,
    pub returns: returns::ReturnsService,
    pub activity: activity::ActivityService,
    pub reports: reports::ReportsService,
    pub email: email::EmailService,
    pub redis: redis::RedisService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig, redis_service: redis::RedisService) -> Self {
        let activity = activity::ActivityService::new(repository.clone());
        let email = email::EmailService::new(config.email.clone());
        let users = users::UsersService::new(repository.clone(), config.auth.clone(), activity.clone());

        Self {
            auth: auth::AuthService::new(
                repository.clone(),
                config.auth.clone(),
                redis_service.clone(),
                email.clone(),
                activity.clone(),
                users.clone(),
            ),
            users,
            catalog: catalog::CatalogService::new(repository.clone(), activity.clone()),
            suppliers: suppliers::SuppliersService::new(repository.clone(), activity.clone()),
            loans: loans::LoansService::new(repository.clone(), config.library.clone(), activity.clone()),
            returns: returns::ReturnsService::new(repository.clone(), config.library.clone(), activity.clone()),
            reports: reports::ReportsService::new(repository.clone(), config.library.clone()),
            activity,
            email,
            redis: redis_service,
            repository,
        }
    }

    /// Database round trip for readiness checks
    pub async fn ping_database(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
