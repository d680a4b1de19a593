//! Items repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        item::{Item, ItemQuery, ItemRecord, StockUpdate},
        pagination::Pagination,
    },
};

const ITEM_SELECT: &str = r#"
    SELECT i.id, i.barcode, i.title, i.author, i.isbn,
           i.category_id, c.name AS category_name,
           i.supplier_id, s.name AS supplier_name,
           i.description, i.quantity_total, i.quantity_available, i.location,
           i.condition, i.purchase_date, i.purchase_price, i.is_active,
           i.created_at, i.updated_at
    FROM items i
    LEFT JOIN categories c ON c.id = i.category_id
    LEFT JOIN suppliers s ON s.id = i.supplier_id
"#;

#[derive(Clone)]
pub struct ItemsRepository {
    pool: Pool<Postgres>,
}

impl ItemsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get an active item by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Item> {
        sqlx::query_as::<_, Item>(&format!("{} WHERE i.id = $1 AND i.is_active", ITEM_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", id)))
    }

    /// Search active items, newest first
    pub async fn search(&self, query: &ItemQuery, pagination: Pagination) -> AppResult<(Vec<Item>, i64)> {
        let pattern = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()));
        let available_only = query.available_only.unwrap_or(false);

        let filter = r#"
            WHERE i.is_active
              AND ($1::TEXT IS NULL
                   OR LOWER(i.title) LIKE $1
                   OR LOWER(i.author) LIKE $1
                   OR LOWER(i.barcode) LIKE $1
                   OR LOWER(i.isbn) LIKE $1)
              AND ($2::INT IS NULL OR i.category_id = $2)
              AND ($3::INT IS NULL OR i.supplier_id = $3)
              AND (NOT $4 OR i.quantity_available > 0)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM items i {}", filter))
            .bind(&pattern)
            .bind(query.category_id)
            .bind(query.supplier_id)
            .bind(available_only)
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, Item>(&format!(
            "{} {} ORDER BY i.created_at DESC, i.id DESC LIMIT $5 OFFSET $6",
            ITEM_SELECT, filter
        ))
        .bind(&pattern)
        .bind(query.category_id)
        .bind(query.supplier_id)
        .bind(available_only)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((items, total))
    }

    /// Check if a barcode is taken, soft-deleted items included
    pub async fn barcode_exists(&self, barcode: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM items
                WHERE barcode = $1 AND ($2::INT IS NULL OR id != $2)
            )
            "#,
        )
        .bind(barcode)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create(&self, item: &ItemRecord) -> AppResult<Item> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO items (
                barcode, title, author, isbn, category_id, supplier_id, description,
                quantity_total, quantity_available, location, condition,
                purchase_date, purchase_price
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            "#,
        )
        .bind(&item.barcode)
        .bind(&item.title)
        .bind(&item.author)
        .bind(&item.isbn)
        .bind(item.category_id)
        .bind(item.supplier_id)
        .bind(&item.description)
        .bind(item.quantity_total)
        .bind(item.quantity_available)
        .bind(&item.location)
        .bind(item.condition)
        .bind(item.purchase_date)
        .bind(item.purchase_price)
        .fetch_one(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Update an item. Stock counts are resolved against the row locked in the
    /// same transaction, so concurrent loans and returns are not overwritten.
    pub async fn update(&self, id: i32, item: &ItemRecord, stock: StockUpdate) -> AppResult<Item> {
        let mut tx = self.pool.begin().await?;

        let (total, available): (i32, i32) = sqlx::query_as(
            "SELECT quantity_total, quantity_available FROM items WHERE id = $1 AND is_active FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", id)))?;

        let (quantity_total, quantity_available) = stock.apply(total, available)?;

        sqlx::query(
            r#"
            UPDATE items SET
                barcode = $2, title = $3, author = $4, isbn = $5,
                category_id = $6, supplier_id = $7, description = $8,
                quantity_total = $9, quantity_available = $10, location = $11,
                condition = $12, purchase_date = $13, purchase_price = $14,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&item.barcode)
        .bind(&item.title)
        .bind(&item.author)
        .bind(&item.isbn)
        .bind(item.category_id)
        .bind(item.supplier_id)
        .bind(&item.description)
        .bind(quantity_total)
        .bind(quantity_available)
        .bind(&item.location)
        .bind(item.condition)
        .bind(item.purchase_date)
        .bind(item.purchase_price)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get_by_id(id).await
    }

    pub async fn active_loan_count(&self, id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE item_id = $1 AND status IN ('borrowed', 'overdue')",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Soft delete (the row stays for loan history)
    pub async fn soft_delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE items SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Item with id {} not found", id)));
        }
        Ok(())
    }
}
