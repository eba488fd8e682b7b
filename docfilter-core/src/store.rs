//! Main document store interface.
//!
//! This module provides the two store types:
//!
//! - [`DocumentStore`] - Store bound to a specific backend implementation
//! - [`DynDocumentStore`] - Dynamic dispatch store for runtime backend selection
//!
//! Both carry the [`FilterParser`] used by their collections and a [`SchemaRegistry`] that
//! maps untyped collection names to schemas.
//!
//! # Example
//!
//! ```ignore
//! use docfilter::prelude::*;
//!
//! let store = DocumentStore::new(backend)
//!     .with_parser_config(ParserConfig::default().with_regex_mode(RegexMode::Literal));
//!
//! let bookings = store.typed_collection::<Booking>();
//! ```

use crate::{
    backend::{DynStoreBackend, StoreBackend},
    collection::{Collection, TypedCollection},
    document::Document,
    error::DocumentStoreResult,
    filter::{FilterParser, ParserConfig},
    schema::{SchemaDescriptor, SchemaRegistry},
};

/// A document store bound to a specific backend implementation.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
///
/// # Example
///
/// ```ignore
/// let store = DocumentStore::new(my_backend);
/// let bookings = store.typed_collection::<Booking>();
/// ```
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
    parser: FilterParser,
    registry: SchemaRegistry,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store with the given backend, the default parser
    /// configuration and an empty schema registry.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            parser: FilterParser::default(),
            registry: SchemaRegistry::new(),
        }
    }

    /// Replaces the parser configuration used by every collection of this store.
    pub fn with_parser_config(mut self, config: ParserConfig) -> Self {
        self.parser = FilterParser::new(config);
        self
    }

    /// Replaces the registry untyped collections look their schema up in.
    pub fn with_registry(mut self, registry: SchemaRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Gets a typed collection for the specified document type.
    ///
    /// The collection name is determined by the document type's `collection_name()` method.
    pub fn typed_collection<'a, D: Document>(&'a self) -> TypedCollection<'a, B, D> {
        TypedCollection::new(&self.parser, &self.backend)
    }

    /// Gets an untyped collection whose schema is registered under `name`.
    ///
    /// Returns `None` if the registry holds no schema for `name`.
    pub fn collection<'a>(&'a self, name: &str) -> Option<Collection<'a, B>> {
        let schema = self.registry.get(name)?;
        Some(Collection::new(name.to_string(), schema, &self.parser, &self.backend))
    }

    /// Gets an untyped collection validated against an explicit schema.
    pub fn collection_with_schema<'a>(
        &'a self,
        name: &str,
        schema: &'a SchemaDescriptor,
    ) -> Collection<'a, B> {
        Collection::new(name.to_string(), schema, &self.parser, &self.backend)
    }

    /// Shuts down the store and releases backend resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the shutdown operation fails.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown().await
    }
}

/// A document store whose backend is selected at runtime.
#[derive(Debug)]
pub struct DynDocumentStore {
    backend: Box<dyn DynStoreBackend>,
    parser: FilterParser,
    registry: SchemaRegistry,
}

impl DynDocumentStore {
    /// Creates a new dynamic document store with the given backend trait object.
    pub fn new(backend: Box<dyn DynStoreBackend>) -> Self {
        Self {
            backend,
            parser: FilterParser::default(),
            registry: SchemaRegistry::new(),
        }
    }

    /// Replaces the parser configuration used by every collection of this store.
    pub fn with_parser_config(mut self, config: ParserConfig) -> Self {
        self.parser = FilterParser::new(config);
        self
    }

    /// Replaces the registry untyped collections look their schema up in.
    pub fn with_registry(mut self, registry: SchemaRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Returns the concrete backend if it is a `B`.
    pub fn backend<B: StoreBackend + 'static>(&self) -> Option<&B> {
        self.backend.as_any().downcast_ref::<B>()
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Gets a typed collection for the specified document type.
    pub fn typed_collection<'a, D: Document>(&'a self) -> TypedCollection<'a, dyn DynStoreBackend, D> {
        TypedCollection::new(&self.parser, &*self.backend)
    }

    /// Gets an untyped collection whose schema is registered under `name`.
    pub fn collection<'a>(&'a self, name: &str) -> Option<Collection<'a, dyn DynStoreBackend>> {
        let schema = self.registry.get(name)?;
        Some(Collection::new(name.to_string(), schema, &self.parser, &*self.backend))
    }

    /// Gets an untyped collection validated against an explicit schema.
    pub fn collection_with_schema<'a>(
        &'a self,
        name: &str,
        schema: &'a SchemaDescriptor,
    ) -> Collection<'a, dyn DynStoreBackend> {
        Collection::new(name.to_string(), schema, &self.parser, &*self.backend)
    }

    /// Shuts down the store and releases backend resources.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown_boxed().await
    }
}

/// Conversion trait for converting a document store into a dynamic owned store.
pub trait IntoDynDocumentStore {
    /// Converts this store into a dynamic owned store.
    fn into_dyn(self) -> DynDocumentStore;
}

impl<B: StoreBackend + 'static> IntoDynDocumentStore for DocumentStore<B> {
    fn into_dyn(self) -> DynDocumentStore {
        DynDocumentStore {
            backend: Box::new(self.backend),
            parser: self.parser,
            registry: self.registry,
        }
    }
}

impl IntoDynDocumentStore for DynDocumentStore {
    fn into_dyn(self) -> DynDocumentStore {
        self
    }
}
