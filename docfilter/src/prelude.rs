//! Convenient re-exports of commonly used types from docfilter.
//!
//! ```ignore
//! use docfilter::prelude::*;
//! ```

pub use bson::{DateTime, Uuid};

pub use docfilter_core::{
    backend::{DynStoreBackend, StoreBackend, StoreBackendBuilder},
    collection::{Collection, TypedCollection},
    criteria::CriteriaBuilder,
    document::{Document, DocumentExt},
    error::{DocumentStoreError, DocumentStoreResult, FilterError, FilterResult},
    filter::{FilterEntry, FilterParser, FilterSet, FilterValue, OperatorKind, ParserConfig, RegexMode},
    page::{Page, PaginationParams},
    query::{Criterion, FieldOp, Filter, Query, QueryBuilder, QueryVisitor, Sort, SortDirection},
    schema::{FieldType, Filterable, SchemaDescriptor, SchemaRegistry},
    store::{DocumentStore, DynDocumentStore, IntoDynDocumentStore},
    value::{ScalarType, TypedValue},
};

pub use docfilter_macros::Filterable;
