//! Supplier management service

use validator::Validate;

use super::activity::ActivityService;
use crate::{
    error::{AppError, AppResult},
    models::{
        activity::{actions, tables, ClientInfo},
        pagination::Pagination,
        supplier::{Supplier, SupplierInput},
        UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct SuppliersService {
    repository: Repository,
    activity: ActivityService,
}

impl SuppliersService {
    pub fn new(repository: Repository, activity: ActivityService) -> Self {
        Self { repository, activity }
    }

    pub async fn list(&self, search: Option<&str>, pagination: Pagination) -> AppResult<(Vec<Supplier>, i64)> {
        self.repository.suppliers.list(search, pagination).await
    }

    pub async fn get(&self, id: i32) -> AppResult<Supplier> {
        self.repository.suppliers.get_by_id(id).await
    }

    pub async fn create(&self, data: SupplierInput, actor: &UserClaims, client: &ClientInfo) -> AppResult<Supplier> {
        let data = data.normalized();
        data.validate()?;

        let supplier = self.repository.suppliers.create(&data).await?;

        self.activity
            .record(
                Some(actor.user_id),
                client,
                actions::CREATE,
                Some(tables::SUPPLIERS),
                Some(supplier.id),
                format!("Added supplier {}", supplier.name),
            )
            .await;

        Ok(supplier)
    }

    pub async fn update(&self, id: i32, data: SupplierInput, actor: &UserClaims, client: &ClientInfo) -> AppResult<Supplier> {
        let data = data.normalized();
        data.validate()?;

        let supplier = self.repository.suppliers.update(id, &data).await?;

        self.activity
            .record(
                Some(actor.user_id),
                client,
                actions::UPDATE,
                Some(tables::SUPPLIERS),
                Some(id),
                format!("Updated supplier {}", supplier.name),
            )
            .await;

        Ok(supplier)
    }

    /// Delete a supplier no active item references
    pub async fn delete(&self, id: i32, actor: &UserClaims, client: &ClientInfo) -> AppResult<()> {
        let supplier = self.repository.suppliers.get_by_id(id).await?;

        let used_by = self.repository.suppliers.count_active_items(id).await?;
        if used_by > 0 {
            return Err(AppError::Conflict(format!(
                "Supplier is referenced by {} book(s)",
                used_by
            )));
        }

        self.repository.suppliers.delete(id).await?;

        self.activity
            .record(
                Some(actor.user_id),
                client,
                actions::DELETE,
                Some(tables::SUPPLIERS),
                Some(id),
                format!("Deleted supplier {}", supplier.name),
            )
            .await;

        Ok(())
    }
}
