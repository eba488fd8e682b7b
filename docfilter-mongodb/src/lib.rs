//! MongoDB backend for docfilter.
//!
//! Queries built from filter tokens are translated into MongoDB filter documents and run
//! with the async driver: paged lookups use `find` with skip/limit, totals use
//! `count_documents` and distinct values use the server-side `distinct` command.
//!
//! Enable the backend through the `mongodb` feature of the main crate:
//!
//! ```toml
//! [dependencies]
//! docfilter = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use docfilter::{backend::StoreBackendBuilder, mongodb::MongoDbStore, store::DocumentStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = MongoDbStore::builder("mongodb://localhost:27017", "hotel")
//!         .build()
//!         .await?;
//!     let store = DocumentStore::new(backend);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docfilter_mongodb;

pub mod store;
pub(crate) mod query;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
