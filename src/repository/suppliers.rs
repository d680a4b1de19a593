//! Suppliers repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        pagination::Pagination,
        supplier::{Supplier, SupplierInput},
    },
};

const SUPPLIER_SELECT: &str = r#"
    SELECT s.id, s.name, s.contact_person, s.phone, s.email, s.address, s.created_at,
           (SELECT COUNT(*) FROM items i WHERE i.supplier_id = s.id AND i.is_active) AS item_count
    FROM suppliers s
"#;

#[derive(Clone)]
pub struct SuppliersRepository {
    pool: Pool<Postgres>,
}

impl SuppliersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List suppliers ordered by name, with active item counts
    pub async fn list(&self, search: Option<&str>, pagination: Pagination) -> AppResult<(Vec<Supplier>, i64)> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()));

        let filter = r#"
            WHERE ($1::TEXT IS NULL
                   OR LOWER(s.name) LIKE $1
                   OR LOWER(s.contact_person) LIKE $1
                   OR LOWER(s.email) LIKE $1)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM suppliers s {}", filter))
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let suppliers = sqlx::query_as::<_, Supplier>(&format!(
            "{} {} ORDER BY s.name LIMIT $2 OFFSET $3",
            SUPPLIER_SELECT, filter
        ))
        .bind(&pattern)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((suppliers, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Supplier> {
        sqlx::query_as::<_, Supplier>(&format!("{} WHERE s.id = $1", SUPPLIER_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Supplier with id {} not found", id)))
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn create(&self, data: &SupplierInput) -> AppResult<Supplier> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO suppliers (name, contact_person, phone, email, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&data.name)
        .bind(&data.contact_person)
        .bind(&data.phone)
        .bind(&data.email)
        .bind(&data.address)
        .fetch_one(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    pub async fn update(&self, id: i32, data: &SupplierInput) -> AppResult<Supplier> {
        let result = sqlx::query(
            r#"
            UPDATE suppliers
            SET name = $2, contact_person = $3, phone = $4, email = $5, address = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.contact_person)
        .bind(&data.phone)
        .bind(&data.email)
        .bind(&data.address)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Supplier with id {} not found", id)));
        }
        self.get_by_id(id).await
    }

    pub async fn count_active_items(&self, id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE supplier_id = $1 AND is_active")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Delete the supplier, detaching soft-deleted items that still point to it
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE items SET supplier_id = NULL WHERE supplier_id = $1 AND NOT is_active")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Supplier with id {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }
}
