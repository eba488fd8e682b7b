//! Execution of assembled queries against a backend.
//!
//! [`QueryExecutor`] runs a [`Query`] in one of two modes:
//!
//! - paged retrieval, which returns one page of documents plus the total match count;
//! - distinct-value enumeration for a single field.
//!
//! Store failures propagate unchanged. Nothing is retried.

use bson::Bson;
use tracing::{debug, instrument};

use crate::{
    backend::StoreBackend,
    error::DocumentStoreResult,
    page::PaginationParams,
    query::{Query, QueryBuilder},
};

/// Runs queries against one collection of a backend.
#[derive(Debug)]
pub struct QueryExecutor<'a, B: StoreBackend + ?Sized> {
    backend: &'a B,
    collection: &'a str,
}

impl<'a, B: StoreBackend + ?Sized> QueryExecutor<'a, B> {
    pub fn new(backend: &'a B, collection: &'a str) -> Self {
        Self { backend, collection }
    }

    /// Returns the collection this executor reads from.
    pub fn collection(&self) -> &str {
        self.collection
    }

    /// Fetches one page of documents matching `query`, along with the number of documents
    /// matching it across all pages.
    ///
    /// Any limit or offset already set on `query` is replaced by the bounds derived from
    /// `params`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidPagination`](crate::error::DocumentStoreError::InvalidPagination)
    /// for a zero page size, or whatever the backend reports.
    #[instrument(level = "debug", target = "docfilter::executor", skip(self, query), fields(collection = self.collection))]
    pub async fn fetch_page(
        &self,
        query: Query,
        params: &PaginationParams,
    ) -> DocumentStoreResult<(Vec<Bson>, u64)> {
        params.validate()?;

        let total = self
            .backend
            .count_documents(query.clone().unpaged(), self.collection)
            .await?;

        let items = self
            .backend
            .query_documents(QueryBuilder::from(query).paginate(params).build(), self.collection)
            .await?;

        debug!(
            target: "docfilter::executor",
            items = items.len(),
            total,
            "Fetched page"
        );

        Ok((items, total))
    }

    /// Returns the distinct values found at `field` across all documents matching `query`.
    ///
    /// Pagination set on `query` is ignored.
    #[instrument(level = "debug", target = "docfilter::executor", skip(self, query), fields(collection = self.collection))]
    pub async fn distinct_values(
        &self,
        query: Query,
        field: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        let values = self
            .backend
            .distinct_values(query.unpaged(), self.collection, field)
            .await?;

        debug!(
            target: "docfilter::executor",
            values = values.len(),
            "Enumerated distinct values"
        );

        Ok(values)
    }
}
