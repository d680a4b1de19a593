//! Page/limit arithmetic shared by list endpoints

use serde::Serialize;
use utoipa::ToSchema;

/// Resolved pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    /// Clamps the requested page to >= 1 and per_page to 1..=max, using
    /// `default_per_page` when none was requested.
    pub fn new(page: Option<i64>, per_page: Option<i64>, default_per_page: i64, max_per_page: i64) -> Self {
        let max_per_page = max_per_page.max(1);
        let per_page = per_page
            .unwrap_or(default_per_page)
            .clamp(1, max_per_page);
        let page = page.unwrap_or(1).max(1);
        Self { page, per_page }
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total + self.per_page - 1) / self.per_page
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Rows of the requested page
    pub items: Vec<T>,
    /// Total number of matching rows
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
            total_pages: pagination.total_pages(total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_offset() {
        let p = Pagination::new(None, None, 10, 100);
        assert_eq!(p, Pagination { page: 1, per_page: 10 });
        assert_eq!(p.offset(), 0);

        let p = Pagination::new(Some(3), Some(25), 10, 100);
        assert_eq!(p.limit(), 25);
        assert_eq!(p.offset(), 50);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let p = Pagination::new(Some(0), Some(1000), 10, 100);
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 100);

        let p = Pagination::new(Some(-4), Some(0), 10, 100);
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 1);
    }

    #[test]
    fn test_huge_page_offset_saturates() {
        let p = Pagination::new(Some(i64::MAX), Some(10), 10, 100);
        assert_eq!(p.page, i64::MAX);
        assert_eq!(p.offset(), i64::MAX);
    }

    #[test]
    fn test_total_pages() {
        let p = Pagination::new(None, Some(10), 10, 100);
        assert_eq!(p.total_pages(0), 0);
        assert_eq!(p.total_pages(10), 1);
        assert_eq!(p.total_pages(11), 2);
        assert_eq!(p.total_pages(95), 10);
    }
}
