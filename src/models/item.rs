//! Item (book) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{blank_to_none, enums::ItemCondition};
use crate::error::AppError;

/// Item with category and supplier names resolved
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Item {
    pub id: i32,
    pub barcode: String,
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    pub supplier_id: Option<i32>,
    pub supplier_name: Option<String>,
    pub description: Option<String>,
    pub quantity_total: i32,
    pub quantity_available: i32,
    pub location: Option<String>,
    pub condition: ItemCondition,
    pub purchase_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub purchase_price: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short item representation embedded in loans and returns
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ItemShort {
    pub id: i32,
    pub barcode: String,
    pub title: String,
    pub author: Option<String>,
}

/// Item list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ItemQuery {
    /// Search in title, author, barcode and ISBN
    pub search: Option<String>,
    pub category_id: Option<i32>,
    pub supplier_id: Option<i32>,
    /// Only items with at least one copy on the shelf
    pub available_only: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create item request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItem {
    /// Generated (`BK` + 6 digits) when blank
    pub barcode: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Title is required (max 255 characters)"))]
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub category_id: Option<i32>,
    pub supplier_id: Option<i32>,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity_total: i32,
    /// Defaults to `quantity_total`
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity_available: Option<i32>,
    pub location: Option<String>,
    pub condition: Option<ItemCondition>,
    pub purchase_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub purchase_price: Option<Decimal>,
}

/// Update item request.
/// Absent fields keep their current value; `null` clears a nullable field.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateItem {
    pub barcode: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Title is required (max 255 characters)"))]
    pub title: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub author: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub isbn: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>, nullable)]
    pub category_id: Option<Option<i32>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>, nullable)]
    pub supplier_id: Option<Option<i32>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub description: Option<Option<String>>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity_total: Option<i32>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity_available: Option<i32>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub location: Option<Option<String>>,
    pub condition: Option<ItemCondition>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, format = Date, nullable)]
    pub purchase_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub purchase_price: Option<Option<Decimal>>,
}

impl UpdateItem {
    pub fn stock(&self) -> StockUpdate {
        StockUpdate {
            quantity_total: self.quantity_total,
            quantity_available: self.quantity_available,
        }
    }
}

/// Requested stock counts, applied to the locked row inside the update transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockUpdate {
    pub quantity_total: Option<i32>,
    pub quantity_available: Option<i32>,
}

impl StockUpdate {
    /// Resolves `(total, available)` against the counts currently stored
    pub fn apply(&self, total: i32, available: i32) -> Result<(i32, i32), AppError> {
        let total = self.quantity_total.unwrap_or(total);
        let available = self.quantity_available.unwrap_or(available);
        validate_stock(total, available)?;
        Ok((total, available))
    }
}

/// Stock must satisfy 0 <= available <= total
fn validate_stock(total: i32, available: i32) -> Result<(), AppError> {
    if total < 0 || available < 0 {
        return Err(AppError::Validation("Quantity cannot be negative".to_string()));
    }
    if available > total {
        return Err(AppError::Validation(
            "Available quantity cannot exceed total quantity".to_string(),
        ));
    }
    Ok(())
}

/// Row written by the repository for both create and update
#[derive(Debug, Clone)]
pub struct ItemRecord {
    pub barcode: String,
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub category_id: Option<i32>,
    pub supplier_id: Option<i32>,
    pub description: Option<String>,
    pub quantity_total: i32,
    pub quantity_available: i32,
    pub location: Option<String>,
    pub condition: ItemCondition,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<Decimal>,
}

impl ItemRecord {
    /// Applies an update on top of the stored item.
    /// Stock counts are copied from `current`; the repository re-reads them under lock.
    pub fn merged(current: &Item, update: UpdateItem) -> Self {
        Self {
            barcode: update.barcode.unwrap_or_else(|| current.barcode.clone()),
            title: update.title.unwrap_or_else(|| current.title.clone()),
            author: patch_text(update.author, &current.author),
            isbn: patch_text(update.isbn, &current.isbn),
            category_id: update.category_id.unwrap_or(current.category_id),
            supplier_id: update.supplier_id.unwrap_or(current.supplier_id),
            description: patch_text(update.description, &current.description),
            quantity_total: current.quantity_total,
            quantity_available: current.quantity_available,
            location: patch_text(update.location, &current.location),
            condition: update.condition.unwrap_or(current.condition),
            purchase_date: update.purchase_date.unwrap_or(current.purchase_date),
            purchase_price: update.purchase_price.unwrap_or(current.purchase_price),
        }
    }

    pub fn check_stock(&self) -> Result<(), AppError> {
        validate_stock(self.quantity_total, self.quantity_available)
    }
}

// Blank text clears the field like an explicit null
fn patch_text(update: Option<Option<String>>, current: &Option<String>) -> Option<String> {
    match update {
        Some(value) => blank_to_none(value),
        None => current.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Item {
        let now = Utc::now();
        Item {
            id: 1,
            barcode: "BK000123".to_string(),
            title: "Laskar Pelangi".to_string(),
            author: Some("Andrea Hirata".to_string()),
            isbn: None,
            category_id: Some(1),
            category_name: Some("Fiksi".to_string()),
            supplier_id: None,
            supplier_name: None,
            description: None,
            quantity_total: 5,
            quantity_available: 3,
            location: Some("Rak A1".to_string()),
            condition: ItemCondition::Good,
            purchase_date: None,
            purchase_price: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let record = ItemRecord::merged(
            &stored(),
            UpdateItem {
                title: Some("Sang Pemimpi".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(record.title, "Sang Pemimpi");
        assert_eq!(record.barcode, "BK000123");
        assert_eq!(record.category_id, Some(1));
        assert_eq!(record.location.as_deref(), Some("Rak A1"));
        assert_eq!(record.author.as_deref(), Some("Andrea Hirata"));
    }

    #[test]
    fn test_null_clears_nullable_fields() {
        let update: UpdateItem = serde_json::from_value(serde_json::json!({
            "category_id": null,
            "location": null,
            "author": "  ",
            "isbn": "978-602-8519-93-9"
        }))
        .unwrap();
        assert_eq!(update.category_id, Some(None));
        assert_eq!(update.supplier_id, None);

        let record = ItemRecord::merged(&stored(), update);
        assert_eq!(record.category_id, None);
        assert_eq!(record.location, None);
        assert_eq!(record.author, None);
        assert_eq!(record.isbn.as_deref(), Some("978-602-8519-93-9"));
        assert_eq!(record.title, "Laskar Pelangi");
    }

    #[test]
    fn test_untouched_stock_follows_locked_row() {
        // A loan took the last copy after the edit form was loaded
        let update = UpdateItem {
            title: Some("Edensor".to_string()),
            ..Default::default()
        };
        assert_eq!(update.stock().apply(5, 0).unwrap(), (5, 0));
    }

    #[test]
    fn test_requested_stock_is_checked_against_locked_row() {
        let stock = StockUpdate {
            quantity_total: Some(6),
            quantity_available: None,
        };
        assert_eq!(stock.apply(5, 3).unwrap(), (6, 3));

        let shrink = StockUpdate {
            quantity_total: Some(2),
            quantity_available: None,
        };
        assert!(matches!(shrink.apply(5, 3), Err(AppError::Validation(_))));

        let negative = StockUpdate {
            quantity_total: None,
            quantity_available: Some(-1),
        };
        assert!(matches!(negative.apply(5, 3), Err(AppError::Validation(_))));
    }
}
