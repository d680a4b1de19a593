//! Data models for Pustaka

pub mod activity;
pub mod category;
pub mod enums;
pub mod fine;
pub mod item;
pub mod loan;
pub mod pagination;
pub mod report;
pub mod return_record;
pub mod supplier;
pub mod user;

// Re-export commonly used types
pub use activity::{ActivityEntry, ClientInfo};
pub use category::Category;
pub use enums::{ItemCondition, LoanStatus, ReturnCondition, Role};
pub use item::{Item, ItemShort};
pub use loan::{Loan, LoanDetails};
pub use pagination::{PaginatedResponse, Pagination};
pub use return_record::{ReturnDetails, ReturnRecord};
pub use supplier::Supplier;
pub use user::{User, UserClaims, UserShort};

/// Trims an optional string, mapping blank values to None
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
