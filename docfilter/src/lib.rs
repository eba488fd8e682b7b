//! Main docfilter crate: typed filter expressions over document stores.
//!
//! This crate is the primary entry point of the docfilter project. It re-exports the core
//! types from the sub-crates and provides access to the storage backends.
//!
//! Clients describe what they want with filter tokens in the shape
//! `<dotted.field.path>|<operator>|<value>`, where the operator is one of `eq`, `ne`, `gt`,
//! `gte`, `lt`, `lte`, `in`, `nin` or `regex` (case-insensitive) and `in`/`nin` values are
//! `;`-separated. Tokens are validated against the document type's schema, coerced to the
//! field's type and turned into a single query:
//!
//! - range bounds on the same field merge, so `room|gte|100` and `room|lt|200` select
//!   `100 <= room < 200`;
//! - for any other operator, the last token on a field wins;
//! - all fields are conjoined.
//!
//! # Quick Start
//!
//! ```ignore
//! use docfilter::{prelude::*, memory::InMemoryStore};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Filterable)]
//! #[serde(rename_all = "camelCase")]
//! pub struct Booking {
//!     pub id: Uuid,
//!     pub name: String,
//!     pub room: i32,
//!     pub check_in: DateTime,
//! }
//!
//! impl Document for Booking {
//!     fn id(&self) -> &Uuid { &self.id }
//!     fn collection_name() -> &'static str { "bookings" }
//! }
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//!     let bookings = store.typed_collection::<Booking>();
//!
//!     let page = bookings
//!         .find_all_with_filter(
//!             &["room|gte|100", "room|lt|200", "name|eq|Alice"],
//!             &PaginationParams::new(0, 10),
//!         )
//!         .await?;
//!
//!     let statuses = bookings
//!         .distinct_values(&["room|gte|100"], "name")
//!         .await?;
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! A typed `DocumentStore` converts into a [`DynDocumentStore`](store::DynDocumentStore)
//! with `into_dyn` when the backend is selected at runtime. Collections of the dynamic store
//! offer the same operations.
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - `mongodb` - Persistent MongoDB backend (requires the `mongodb` feature)

#[allow(unused_extern_crates)]
extern crate self as docfilter;

pub mod prelude;

pub use docfilter_core::{
    backend, collection, criteria, document, error, executor, filter, page, query, schema, store,
    value,
};

/// Derives [`Filterable`](schema::Filterable) for a struct with named fields.
pub use docfilter_macros::Filterable;

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docfilter_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docfilter_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
