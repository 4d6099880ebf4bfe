//! Offset pagination with 1-based page numbering.
//!
//! Listing operations take a validated `(page, size)` pair and return
//! at most `size` rows starting at offset `(page - 1) * size`.
//! Non-positive pages or sizes are caller errors, not clamped.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on a single listing request.
pub const MAX_PAGE_SIZE: i64 = 500;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page number {page} is invalid; pages are numbered from 1")]
    InvalidPage { page: i64 },
    #[error("page size {size} is invalid; size must be between 1 and {MAX_PAGE_SIZE}")]
    InvalidSize { size: i64 },
}

/// A validated `(page, size)` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: i64,
    size: i64,
}

impl PageRequest {
    pub fn new(page: i64, size: i64) -> Result<Self, PaginationError> {
        if page < 1 {
            return Err(PaginationError::InvalidPage { page });
        }
        if size < 1 || size > MAX_PAGE_SIZE {
            return Err(PaginationError::InvalidSize { size });
        }
        Ok(Self { page, size })
    }

    /// First page with the given size.
    pub fn first(size: i64) -> Result<Self, PaginationError> {
        Self::new(1, size)
    }

    pub fn page(self) -> i64 {
        self.page
    }

    pub fn size(self) -> i64 {
        self.size
    }

    /// Row offset of the first item on this page.
    pub fn offset(self) -> i64 {
        (self.page - 1) * self.size
    }

    /// The request for the page after this one.
    pub fn next(self) -> Self {
        Self {
            page: self.page + 1,
            size: self.size,
        }
    }
}
