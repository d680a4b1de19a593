//! Supplier model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::blank_to_none;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Supplier {
    pub id: i32,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Number of active items supplied
    pub item_count: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SupplierInput {
    #[validate(length(min = 1, max = 150, message = "Supplier name is required (max 150 characters)"))]
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub address: Option<String>,
}

impl SupplierInput {
    /// Blank optional strings are stored as NULL
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.contact_person = blank_to_none(self.contact_person);
        self.phone = blank_to_none(self.phone);
        self.email = blank_to_none(self.email);
        self.address = blank_to_none(self.address);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_email_is_dropped_before_validation() {
        let input = SupplierInput {
            name: "  Gramedia  ".to_string(),
            contact_person: Some("".to_string()),
            phone: None,
            email: Some("   ".to_string()),
            address: Some(" Jakarta ".to_string()),
        }
        .normalized();

        assert_eq!(input.name, "Gramedia");
        assert!(input.contact_person.is_none());
        assert!(input.email.is_none());
        assert_eq!(input.address.as_deref(), Some("Jakarta"));
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_invalid_email_rejected() {
        let input = SupplierInput {
            name: "Erlangga".to_string(),
            contact_person: None,
            phone: None,
            email: Some("not-an-email".to_string()),
            address: None,
        }
        .normalized();
        assert!(input.validate().is_err());
    }
}
