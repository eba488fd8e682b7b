//! Storage backend abstraction for filtered document lookups.
//!
//! This module defines the traits that abstract over document store implementations,
//! allowing the same parsed filters to run against an in-memory store, MongoDB, or any
//! other backend that can find, count and enumerate distinct values.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`DynStoreBackend`]: A trait for dynamic dispatch over backend implementations
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances
//!
//! # Examples
//!
//! ```ignore
//! use docfilter_core::{backend::StoreBackend, query::{Filter, Query}};
//!
//! let query = Query::builder()
//!     .criterion(Filter::gte("room", 100))
//!     .build();
//!
//! let matching = backend.count_documents(query, "bookings").await?;
//! ```

use async_trait::async_trait;
use bson::{Bson, Uuid};
use std::{any::Any, fmt::Debug};

use crate::{error::DocumentStoreResult, query::Query};

/// Abstract interface for document storage backends.
///
/// Implementations must be thread-safe and support concurrent access from multiple async
/// tasks. Failures are reported as [`DocumentStoreError`](crate::error::DocumentStoreError)
/// and are never retried by callers in this crate.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts new documents into a collection.
    ///
    /// # Arguments
    ///
    /// * `documents` - A vector of (UUID, BSON document) pairs to insert
    /// * `collection` - The name of the collection to insert into. Created automatically if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DocumentAlreadyExists`](crate::error::DocumentStoreError::DocumentAlreadyExists)
    /// if an ID is already present in the collection.
    async fn insert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()>;

    /// Returns the documents matching every criterion of `query`, honoring its sort,
    /// offset and limit.
    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Counts the documents matching every criterion of `query`.
    ///
    /// Limit, offset and sort are ignored.
    async fn count_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<u64>;

    /// Returns the distinct values found at `field` across the documents matching `query`.
    ///
    /// Limit, offset and sort are ignored. Array values contribute each of their elements.
    /// The order of the returned values is backend-specific.
    async fn distinct_values(
        &self,
        query: Query,
        collection: &str,
        field: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op, but backends with external connections
    /// should override this.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend + ?Sized,
{
    async fn insert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        (**self)
            .insert_documents(documents, collection)
            .await
    }

    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        (**self)
            .query_documents(query, collection)
            .await
    }

    async fn count_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<u64> {
        (**self)
            .count_documents(query, collection)
            .await
    }

    async fn distinct_values(
        &self,
        query: Query,
        collection: &str,
        field: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        (**self)
            .distinct_values(query, collection, field)
            .await
    }
}

/// Object-safe counterpart of [`StoreBackend`], implemented for every backend.
///
/// Used by [`DynDocumentStore`](crate::store::DynDocumentStore) when the backend is chosen
/// at runtime.
#[async_trait]
pub trait DynStoreBackend: Send + Sync + Debug {
    async fn insert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()>;
    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;
    async fn count_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<u64>;
    async fn distinct_values(
        &self,
        query: Query,
        collection: &str,
        field: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;
    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()>;

    fn as_any(&self) -> &dyn Any;
}

#[async_trait]
impl<B: StoreBackend + 'static> DynStoreBackend for B {
    async fn insert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        StoreBackend::insert_documents(self, documents, collection).await
    }

    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        StoreBackend::query_documents(self, query, collection).await
    }

    async fn count_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<u64> {
        StoreBackend::count_documents(self, query, collection).await
    }

    async fn distinct_values(
        &self,
        query: Query,
        collection: &str,
        field: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        StoreBackend::distinct_values(self, query, collection, field).await
    }

    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()> {
        StoreBackend::shutdown(*self).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl StoreBackend for dyn DynStoreBackend {
    async fn insert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        DynStoreBackend::insert_documents(self, documents, collection).await
    }

    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        DynStoreBackend::query_documents(self, query, collection).await
    }

    async fn count_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<u64> {
        DynStoreBackend::count_documents(self, query, collection).await
    }

    async fn distinct_values(
        &self,
        query: Query,
        collection: &str,
        field: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        DynStoreBackend::distinct_values(self, query, collection, field).await
    }
}

/// Asynchronous factory for a backend, typically holding its connection settings.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
