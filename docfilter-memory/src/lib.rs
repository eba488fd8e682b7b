//! In-memory document storage backend for docfilter.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It evaluates filter criteria the way a document store does, which makes it suitable for
//! tests, development and small data sets.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Full query support** - Filtering on dotted paths, sorting, pagination and counts
//! - **Distinct values** - Array values unwound, duplicates collapsed in first-seen order
//!
//! # Quick Start
//!
//! ```ignore
//! use docfilter::{prelude::*, memory::InMemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let store = DocumentStore::new(backend);
//!     let bookings = store.typed_collection::<Booking>();
//!
//!     let page = bookings
//!         .find_all_with_filter(&["room|gte|100"], &PaginationParams::default())
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docfilter_memory;

pub mod store;
pub(crate) mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
