//! Collection types for filtered document lookups.
//!
//! A collection binds a backend collection to the schema its filters are validated against.
//! Both collection types expose the same two lookups:
//!
//! - `find_all_with_filter` returns one [`Page`] of documents matching the filter tokens;
//! - `distinct_values` returns every distinct value of a field across the matching documents.
//!
//! Filter tokens are always fully parsed and validated before the backend is contacted.
//!
//! # Collection Types
//!
//! - [`Collection`] - Untyped collection with explicit BSON documents
//! - [`TypedCollection`] - Type-safe collection for a specific document type
//!
//! # Example
//!
//! ```ignore
//! let bookings = store.typed_collection::<Booking>();
//!
//! let page = bookings
//!     .find_all_with_filter(&["room|gte|100", "name|eq|Alice"], &PaginationParams::new(0, 10))
//!     .await?;
//!
//! let rooms = bookings
//!     .distinct_values(&["status|eq|CONFIRMED"], "room")
//!     .await?;
//! ```

use bson::{Bson, Uuid};
use std::marker::PhantomData;

use crate::{
    backend::StoreBackend,
    criteria::CriteriaBuilder,
    document::{Document, DocumentExt},
    error::DocumentStoreResult,
    executor::QueryExecutor,
    filter::FilterParser,
    page::{Page, PaginationParams},
    query::Query,
    schema::SchemaDescriptor,
};

/// An untyped collection with a reference to a storage backend.
///
/// All documents are represented as BSON values. Filters are validated against the
/// collection's [`SchemaDescriptor`].
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the backend, schema and parser references
/// * `B` - The storage backend type
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend + ?Sized> {
    name: String,
    schema: &'a SchemaDescriptor,
    parser: &'a FilterParser,
    backend: &'a B,
}

impl<'a, B: StoreBackend + ?Sized> Collection<'a, B> {
    pub(crate) fn new(
        name: String,
        schema: &'a SchemaDescriptor,
        parser: &'a FilterParser,
        backend: &'a B,
    ) -> Self {
        Self {
            name,
            schema,
            parser,
            backend,
        }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the schema filters are validated against.
    pub fn schema(&self) -> &SchemaDescriptor {
        self.schema
    }

    /// Parses filter tokens and builds the query they describe, without pagination.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Filter`](crate::error::DocumentStoreError::Filter) for the
    /// first token that fails to parse.
    pub fn filter_query<S: AsRef<str>>(&self, tokens: &[S]) -> DocumentStoreResult<Query> {
        let filters = self.parser.parse(tokens, self.schema)?;
        Ok(CriteriaBuilder::build(&filters)?)
    }

    /// Inserts new documents into the collection.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DocumentAlreadyExists`](crate::error::DocumentStoreError::DocumentAlreadyExists)
    /// if an ID is already taken, or whatever else the backend reports.
    pub async fn insert(&self, documents: Vec<(Uuid, Bson)>) -> DocumentStoreResult<()> {
        self.backend
            .insert_documents(documents, &self.name)
            .await
    }

    /// Queries documents in the collection using a structured query.
    pub async fn query(&self, query: Query) -> DocumentStoreResult<Vec<Bson>> {
        self.backend
            .query_documents(query, &self.name)
            .await
    }

    /// Returns one page of the documents matching every filter token.
    ///
    /// # Errors
    ///
    /// Returns a filter error for invalid tokens and
    /// [`DocumentStoreError::InvalidPagination`](crate::error::DocumentStoreError::InvalidPagination)
    /// for a zero page size, in both cases without contacting the backend.
    pub async fn find_all_with_filter<S: AsRef<str>>(
        &self,
        tokens: &[S],
        params: &PaginationParams,
    ) -> DocumentStoreResult<Page<Bson>> {
        let query = self.filter_query(tokens)?;
        let (items, total) = self
            .executor()
            .fetch_page(query, params)
            .await?;

        Ok(Page::from_parts(items, total, params))
    }

    /// Returns the distinct values of `field` across the documents matching every filter
    /// token.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnknownField`](crate::error::FilterError::UnknownField) if `field`
    /// is not part of the schema, and a filter error for invalid tokens.
    pub async fn distinct_values<S: AsRef<str>>(
        &self,
        tokens: &[S],
        field: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        self.schema.resolve_field(field)?;
        let query = self.filter_query(tokens)?;

        self.executor()
            .distinct_values(query, field)
            .await
    }

    fn executor(&self) -> QueryExecutor<'_, B> {
        QueryExecutor::new(self.backend, &self.name)
    }
}

/// A type-safe collection for a specific document type.
///
/// Documents are serialized to BSON on the way in and deserialized into `D` on the way
/// out. Filters are validated against `D`'s schema.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the backend and parser references
/// * `B` - The storage backend type
/// * `D` - The document type, which must implement [`Document`]
#[derive(Debug)]
pub struct TypedCollection<'a, B: StoreBackend + ?Sized, D: Document> {
    inner: Collection<'a, B>,
    _marker: PhantomData<D>,
}

impl<'a, B: StoreBackend + ?Sized, D: Document> TypedCollection<'a, B, D> {
    pub(crate) fn new(parser: &'a FilterParser, backend: &'a B) -> Self {
        Self {
            inner: Collection::new(D::collection_name().to_string(), D::schema(), parser, backend),
            _marker: PhantomData,
        }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Returns the underlying untyped collection.
    pub fn untyped(&self) -> &Collection<'a, B> {
        &self.inner
    }

    /// Parses filter tokens against `D`'s schema and builds the query they describe.
    pub fn filter_query<S: AsRef<str>>(&self, tokens: &[S]) -> DocumentStoreResult<Query> {
        self.inner.filter_query(tokens)
    }

    /// Inserts new documents into the collection.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if a document cannot be converted to BSON, or
    /// whatever the backend reports.
    pub async fn insert(&self, documents: Vec<D>) -> DocumentStoreResult<()> {
        let documents = documents
            .iter()
            .map(|document| Ok((*document.id(), document.to_bson()?)))
            .collect::<DocumentStoreResult<Vec<_>>>()?;

        self.inner.insert(documents).await
    }

    /// Queries documents in the collection using a structured query.
    pub async fn query(&self, query: Query) -> DocumentStoreResult<Vec<D>> {
        self.inner
            .query(query)
            .await?
            .into_iter()
            .map(D::from_bson)
            .collect()
    }

    /// Returns one page of the documents matching every filter token.
    pub async fn find_all_with_filter<S: AsRef<str>>(
        &self,
        tokens: &[S],
        params: &PaginationParams,
    ) -> DocumentStoreResult<Page<D>> {
        self.inner
            .find_all_with_filter(tokens, params)
            .await?
            .try_map_items(D::from_bson)
    }

    /// Returns the distinct values of `field` across the documents matching every filter
    /// token.
    pub async fn distinct_values<S: AsRef<str>>(
        &self,
        tokens: &[S],
        field: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        self.inner
            .distinct_values(tokens, field)
            .await
    }
}
