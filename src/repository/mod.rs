//! Repository layer for database operations

pub mod activity;
pub mod categories;
pub mod items;
pub mod loans;
pub mod reports;
pub mod returns;
pub mod suppliers;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub categories: categories::CategoriesRepository,
    pub suppliers: suppliers::SuppliersRepository,
    pub items: items::ItemsRepository,
    pub loans: loans::LoansRepository,
    pub returns: returns::ReturnsRepository,
    pub activity: activity::ActivityRepository,
    pub reports: reports::ReportsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            categories: categories::CategoriesRepository::new(pool.clone()),
            suppliers: suppliers::SuppliersRepository::new(pool.clone()),
            items: items::ItemsRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            returns: returns::ReturnsRepository::new(pool.clone()),
            activity: activity::ActivityRepository::new(pool.clone()),
            reports: reports::ReportsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
