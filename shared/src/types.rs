//! Common types used across the service

use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    /// Build pagination from optional query values, clamping nonsense to sane bounds
    pub fn from_query(page: Option<u32>, per_page: Option<u32>, default_per_page: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(default_per_page).clamp(1, 500),
        }
    }

    /// Number of rows to skip
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub current_page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PaginationMeta {
    pub fn new(pagination: Pagination, total_items: u64) -> Self {
        let per_page = u64::from(pagination.per_page.max(1));
        let total_pages = total_items.div_ceil(per_page) as u32;
        Self {
            current_page: pagination.page,
            per_page: pagination.per_page,
            total_items,
            total_pages,
            has_next: pagination.page < total_pages,
            has_previous: pagination.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_for_first_page_is_zero() {
        let p = Pagination::from_query(None, None, 10);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 10);
    }

    #[test]
    fn test_page_zero_is_treated_as_first_page() {
        let p = Pagination::from_query(Some(0), Some(5), 10);
        assert_eq!(p.page, 1);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_meta_flags() {
        let meta = PaginationMeta::new(Pagination { page: 2, per_page: 10 }, 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_previous);

        let last = PaginationMeta::new(Pagination { page: 3, per_page: 10 }, 25);
        assert!(!last.has_next);
    }

    #[test]
    fn test_meta_empty_result() {
        let meta = PaginationMeta::new(Pagination::default(), 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_previous);
    }
}
