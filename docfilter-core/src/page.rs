//! Pagination and result types for managing query results.
//!
//! This module provides the [`Page`] struct returned by paged lookups and the
//! [`PaginationParams`] a caller supplies to request one.

use serde::{Deserialize, Serialize};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// A single page of results.
///
/// Serializes with camelCase keys:
///
/// ```json
/// { "currentPage": 0, "totalItems": 42, "totalPages": 5, "items": [], "hasNext": true }
/// ```
///
/// # Type Parameters
///
/// * `T` - The type of items contained in this page
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Zero-based index of this page.
    pub current_page: usize,
    /// Number of matching items across all pages.
    pub total_items: u64,
    /// Number of pages needed to hold every matching item.
    pub total_pages: u64,
    /// The items contained in this page.
    pub items: Vec<T>,
    /// Whether a page after this one exists.
    pub has_next: bool,
}

impl<T> Page<T> {
    /// Creates a new builder for constructing a page with custom settings.
    pub fn builder(items: Vec<T>) -> PageBuilder<T> {
        PageBuilder::new(items)
    }

    /// Builds a page from the items of one page, the total number of matching items and
    /// the parameters the page was requested with.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let page = Page::from_parts(vec![1, 2, 3], 23, &PaginationParams::new(1, 10));
    ///
    /// assert_eq!(page.total_pages, 3);
    /// assert!(page.has_next);
    /// ```
    pub fn from_parts(items: Vec<T>, total_items: u64, params: &PaginationParams) -> Self {
        let total_pages = match params.size {
            0 => 0,
            size => total_items.div_ceil(size as u64),
        };

        Page::builder(items)
            .with_current_page(params.page)
            .with_total_items(total_items)
            .with_total_pages(total_pages)
            .with_has_next((params.page as u64) < total_pages.saturating_sub(1))
            .build()
    }

    /// Converts the items of this page, keeping the pagination metadata.
    pub fn try_map_items<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            current_page: self.current_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
            items: self.items.into_iter().map(f).collect::<Result<Vec<_>, _>>()?,
            has_next: self.has_next,
        })
    }
}

impl<T: Serialize> Page<T> {
    /// Serializes this page to JSON.
    pub fn to_json(&self) -> DocumentStoreResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            current_page: 0,
            total_items: 0,
            total_pages: 0,
            items: Vec::new(),
            has_next: false,
        }
    }
}

/// Builder for constructing [`Page`] instances with fluent API.
pub struct PageBuilder<T> {
    items: Vec<T>,
    current_page: usize,
    total_items: u64,
    total_pages: u64,
    has_next: bool,
}

impl<T> PageBuilder<T> {
    /// Creates a new builder with the given items.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            current_page: 0,
            total_items: 0,
            total_pages: 0,
            has_next: false,
        }
    }

    /// Sets the zero-based index of the page.
    pub fn with_current_page(mut self, current_page: usize) -> Self {
        self.current_page = current_page;
        self
    }

    /// Sets the total count of items across all pages.
    pub fn with_total_items(mut self, total_items: u64) -> Self {
        self.total_items = total_items;
        self
    }

    /// Sets the total number of pages.
    pub fn with_total_pages(mut self, total_pages: u64) -> Self {
        self.total_pages = total_pages;
        self
    }

    /// Sets whether a next page exists.
    pub fn with_has_next(mut self, has_next: bool) -> Self {
        self.has_next = has_next;
        self
    }

    /// Builds and returns the final [`Page`] instance.
    pub fn build(self) -> Page<T> {
        Page {
            current_page: self.current_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
            items: self.items,
            has_next: self.has_next,
        }
    }
}

/// Parameters for paginating through large result sets.
///
/// Pages are 0-indexed (page 0 is the first page).
///
/// # Example
///
/// ```ignore
/// use docfilter_core::page::PaginationParams;
///
/// let params = PaginationParams::new(2, 50);
/// // Retrieves the third page with 50 items per page
/// assert_eq!(params.offset(), 100);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PaginationParams {
    /// The page index (0-indexed).
    pub page: usize,
    /// Number of items per page.
    pub size: usize,
}

impl PaginationParams {
    /// Creates new pagination parameters.
    ///
    /// # Arguments
    ///
    /// * `page` - The page index (0-indexed)
    /// * `size` - Number of items per page
    pub fn new(page: usize, size: usize) -> Self {
        Self { page, size }
    }

    /// Creates a new builder for constructing pagination parameters.
    pub fn builder() -> PaginationParamsBuilder {
        PaginationParamsBuilder::new()
    }

    /// Calculates the offset (number of items to skip) for this page.
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }

    /// Checks that these parameters describe a page that can be served.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidPagination`] if the page size is zero or the
    /// offset overflows.
    pub fn validate(&self) -> DocumentStoreResult<()> {
        if self.size == 0 {
            return Err(DocumentStoreError::InvalidPagination(
                "page size must be positive".to_string(),
            ));
        }

        if self.page.checked_mul(self.size).is_none() {
            return Err(DocumentStoreError::InvalidPagination(format!(
                "page {} of size {} is out of range",
                self.page, self.size
            )));
        }

        Ok(())
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 0, size: 10 }
    }
}

/// Builder for constructing [`PaginationParams`] instances.
///
/// This builder allows flexible construction of pagination parameters
/// with optional overrides from defaults.
pub struct PaginationParamsBuilder {
    page: Option<usize>,
    size: Option<usize>,
}

impl PaginationParamsBuilder {
    /// Creates a new builder with no parameters set.
    pub fn new() -> Self {
        Self { page: None, size: None }
    }

    /// Sets the page index (0-indexed).
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the number of items per page.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    /// Builds and returns the [`PaginationParams`].
    ///
    /// Uses defaults for any unset values (page=0, size=10).
    pub fn build(self) -> PaginationParams {
        PaginationParams {
            page: self.page.unwrap_or(0),
            size: self.size.unwrap_or(10),
        }
    }
}

impl Default for PaginationParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        assert_eq!(PaginationParams::new(0, 10).offset(), 0);
        assert_eq!(PaginationParams::new(3, 20).offset(), 60);
    }

    #[test]
    fn test_builder_defaults() {
        assert_eq!(PaginationParams::builder().build(), PaginationParams::new(0, 10));
        assert_eq!(
            PaginationParams::builder().with_page(4).with_size(5).build(),
            PaginationParams::new(4, 5)
        );
    }

    #[test]
    fn test_validate_rejects_zero_size() {
        assert!(matches!(
            PaginationParams::new(0, 0).validate(),
            Err(DocumentStoreError::InvalidPagination(_))
        ));
        assert!(PaginationParams::new(0, 1).validate().is_ok());
        assert!(PaginationParams::new(usize::MAX, 2).validate().is_err());
    }

    #[test]
    fn test_from_parts_page_past_the_end() {
        let page = Page::<i32>::from_parts(vec![], 1, &PaginationParams::new(usize::MAX, 1));

        assert_eq!(page.current_page, usize::MAX);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next);

        let empty = Page::<i32>::from_parts(vec![], 0, &PaginationParams::new(0, 10));
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
    }

    #[test]
    fn test_from_parts_middle_page() {
        let page = Page::from_parts(vec![11, 12], 23, &PaginationParams::new(1, 10));

        assert_eq!(page.current_page, 1);
        assert_eq!(page.total_items, 23);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);
    }

    #[test]
    fn test_from_parts_last_page() {
        let page = Page::from_parts(vec![21], 21, &PaginationParams::new(2, 10));
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_next);
    }

    #[test]
    fn test_from_parts_no_results() {
        let page = Page::<i32>::from_parts(vec![], 0, &PaginationParams::new(0, 10));
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next);
    }

    #[test]
    fn test_page_json_shape() {
        let page = Page::from_parts(vec!["a"], 1, &PaginationParams::new(0, 10));
        assert_eq!(
            page.to_json().unwrap(),
            serde_json::json!({
                "currentPage": 0,
                "totalItems": 1,
                "totalPages": 1,
                "items": ["a"],
                "hasNext": false,
            })
        );
    }

    #[test]
    fn test_try_map_items_keeps_metadata() {
        let page = Page::from_parts(vec!["1", "2"], 12, &PaginationParams::new(0, 2));
        let mapped = page
            .try_map_items(|item| item.parse::<i32>())
            .unwrap();

        assert_eq!(mapped.items, vec![1, 2]);
        assert_eq!(mapped.total_pages, 6);
        assert!(mapped.has_next);
    }
}
