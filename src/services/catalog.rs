//! Catalog management service: items and categories

use validator::Validate;

use super::{activity::ActivityService, codes::generate_barcode};
use crate::{
    error::{AppError, AppResult},
    models::{
        activity::{actions, tables, ClientInfo},
        blank_to_none,
        category::{Category, CategoryInput},
        item::{CreateItem, Item, ItemQuery, ItemRecord, UpdateItem},
        loan::LoanDetails,
        pagination::Pagination,
        UserClaims,
    },
    repository::Repository,
};

const MAX_BARCODE_ATTEMPTS: usize = 20;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    activity: ActivityService,
}

impl CatalogService {
    pub fn new(repository: Repository, activity: ActivityService) -> Self {
        Self { repository, activity }
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    /// Search items with filters
    pub async fn search_items(&self, query: &ItemQuery, pagination: Pagination) -> AppResult<(Vec<Item>, i64)> {
        self.repository.items.search(query, pagination).await
    }

    pub async fn get_item(&self, id: i32) -> AppResult<Item> {
        self.repository.items.get_by_id(id).await
    }

    /// All loans of an item, newest first
    pub async fn item_loans(&self, id: i32) -> AppResult<Vec<LoanDetails>> {
        self.repository.items.get_by_id(id).await?;
        self.repository.loans.list_for_item(id, super::today()).await
    }

    pub async fn create_item(&self, data: CreateItem, actor: &UserClaims, client: &ClientInfo) -> AppResult<Item> {
        data.validate()?;

        let barcode = match blank_to_none(data.barcode) {
            Some(barcode) => {
                if self.repository.items.barcode_exists(&barcode, None).await? {
                    return Err(AppError::Conflict(format!("Barcode {} already exists", barcode)));
                }
                barcode
            }
            None => self.free_barcode().await?,
        };

        let record = ItemRecord {
            barcode,
            title: data.title.trim().to_string(),
            author: blank_to_none(data.author),
            isbn: blank_to_none(data.isbn),
            category_id: data.category_id,
            supplier_id: data.supplier_id,
            description: blank_to_none(data.description),
            quantity_total: data.quantity_total,
            quantity_available: data.quantity_available.unwrap_or(data.quantity_total),
            location: blank_to_none(data.location),
            condition: data.condition.unwrap_or_default(),
            purchase_date: data.purchase_date,
            purchase_price: data.purchase_price,
        };
        record.check_stock()?;
        self.check_references(&record).await?;

        let item = self.repository.items.create(&record).await?;

        tracing::info!("Item {} ({}) created", item.id, item.barcode);
        self.activity
            .record(
                Some(actor.user_id),
                client,
                actions::CREATE,
                Some(tables::ITEMS),
                Some(item.id),
                format!("Added book {} ({})", item.title, item.barcode),
            )
            .await;

        Ok(item)
    }

    pub async fn update_item(&self, id: i32, data: UpdateItem, actor: &UserClaims, client: &ClientInfo) -> AppResult<Item> {
        data.validate()?;
        let current = self.repository.items.get_by_id(id).await?;

        let stock = data.stock();
        let mut record = ItemRecord::merged(&current, data);
        record.barcode = record.barcode.trim().to_string();
        record.title = record.title.trim().to_string();
        if record.barcode.is_empty() {
            return Err(AppError::Validation("Barcode cannot be empty".to_string()));
        }
        if record.barcode != current.barcode
            && self.repository.items.barcode_exists(&record.barcode, Some(id)).await?
        {
            return Err(AppError::Conflict(format!("Barcode {} already exists", record.barcode)));
        }
        self.check_references(&record).await?;

        let item = self.repository.items.update(id, &record, stock).await?;

        self.activity
            .record(
                Some(actor.user_id),
                client,
                actions::UPDATE,
                Some(tables::ITEMS),
                Some(id),
                format!("Updated book {} ({})", item.title, item.barcode),
            )
            .await;

        Ok(item)
    }

    /// Soft delete an item without open loans
    pub async fn delete_item(&self, id: i32, actor: &UserClaims, client: &ClientInfo) -> AppResult<()> {
        let item = self.repository.items.get_by_id(id).await?;

        let active = self.repository.items.active_loan_count(id).await?;
        if active > 0 {
            return Err(AppError::Conflict(format!(
                "Book is currently on loan ({} active loan(s))",
                active
            )));
        }

        self.repository.items.soft_delete(id).await?;

        self.activity
            .record(
                Some(actor.user_id),
                client,
                actions::DELETE,
                Some(tables::ITEMS),
                Some(id),
                format!("Deleted book {} ({})", item.title, item.barcode),
            )
            .await;

        Ok(())
    }

    async fn free_barcode(&self) -> AppResult<String> {
        for _ in 0..MAX_BARCODE_ATTEMPTS {
            let candidate = generate_barcode(&mut rand::thread_rng());
            if !self.repository.items.barcode_exists(&candidate, None).await? {
                return Ok(candidate);
            }
        }
        Err(AppError::Internal("Could not generate a unique barcode".to_string()))
    }

    async fn check_references(&self, record: &ItemRecord) -> AppResult<()> {
        if let Some(category_id) = record.category_id {
            if !self.repository.categories.exists(category_id).await? {
                return Err(AppError::Validation(format!("Category {} does not exist", category_id)));
            }
        }
        if let Some(supplier_id) = record.supplier_id {
            if !self.repository.suppliers.exists(supplier_id).await? {
                return Err(AppError::Validation(format!("Supplier {} does not exist", supplier_id)));
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------------

    pub async fn list_categories(&self, search: Option<&str>, pagination: Pagination) -> AppResult<(Vec<Category>, i64)> {
        self.repository.categories.list(search, pagination).await
    }

    pub async fn get_category(&self, id: i32) -> AppResult<Category> {
        self.repository.categories.get_by_id(id).await
    }

    pub async fn create_category(&self, data: CategoryInput, actor: &UserClaims, client: &ClientInfo) -> AppResult<Category> {
        let name = data.name.trim().to_string();
        let input = CategoryInput { name, ..data };
        input.validate()?;

        if self.repository.categories.name_exists(&input.name, None).await? {
            return Err(AppError::Conflict(format!("Category {} already exists", input.name)));
        }

        let description = blank_to_none(input.description);
        let category = self
            .repository
            .categories
            .create(&input.name, description.as_deref())
            .await?;

        self.activity
            .record(
                Some(actor.user_id),
                client,
                actions::CREATE,
                Some(tables::CATEGORIES),
                Some(category.id),
                format!("Added category {}", category.name),
            )
            .await;

        Ok(category)
    }

    pub async fn update_category(
        &self,
        id: i32,
        data: CategoryInput,
        actor: &UserClaims,
        client: &ClientInfo,
    ) -> AppResult<Category> {
        let name = data.name.trim().to_string();
        let input = CategoryInput { name, ..data };
        input.validate()?;

        self.repository.categories.get_by_id(id).await?;
        if self.repository.categories.name_exists(&input.name, Some(id)).await? {
            return Err(AppError::Conflict(format!("Category {} already exists", input.name)));
        }

        let description = blank_to_none(input.description);
        let category = self
            .repository
            .categories
            .update(id, &input.name, description.as_deref())
            .await?;

        self.activity
            .record(
                Some(actor.user_id),
                client,
                actions::UPDATE,
                Some(tables::CATEGORIES),
                Some(id),
                format!("Updated category {}", category.name),
            )
            .await;

        Ok(category)
    }

    /// Delete a category no active item uses
    pub async fn delete_category(&self, id: i32, actor: &UserClaims, client: &ClientInfo) -> AppResult<()> {
        let category = self.repository.categories.get_by_id(id).await?;

        let used_by = self.repository.categories.count_active_items(id).await?;
        if used_by > 0 {
            return Err(AppError::Conflict(format!(
                "Category is used by {} book(s)",
                used_by
            )));
        }

        self.repository.categories.delete(id).await?;

        self.activity
            .record(
                Some(actor.user_id),
                client,
                actions::DELETE,
                Some(tables::CATEGORIES),
                Some(id),
                format!("Deleted category {}", category.name),
            )
            .await;

        Ok(())
    }
}
