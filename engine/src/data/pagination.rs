//! Page-based pagination

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Page number and page size, both starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Pagination {
    /// The page number
    #[validate(range(min = 1))]
    pub page: u32,
    /// The number of items per page
    #[validate(range(min = 1))]
    pub count: u32,
}

/// Offset/limit pair derived from a [`Pagination`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u64,
}

impl Pagination {
    pub fn new(page: u32, count: u32) -> Self {
        Self { page, count }
    }

    /// Translate to rows skipped and rows taken
    ///
    /// Bounds are checked by [`Validate`]; a page of 0 is treated as page 1.
    pub fn window(&self) -> PageWindow {
        let count = u64::from(self.count);
        PageWindow {
            offset: u64::from(self.page.saturating_sub(1)) * count,
            limit: count,
        }
    }
}
