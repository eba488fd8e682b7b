//! Typed filter expressions over document stores.
//!
//! This crate is the core of the docfilter project. It turns client-supplied filter tokens
//! such as `room|gte|100` into type-checked queries and runs them with pagination or
//! distinct-value enumeration:
//!
//! - **Schemas** ([`schema`]) - Field descriptors and dotted path resolution
//! - **Values** ([`value`]) - Scalar types and text coercion
//! - **Filter parsing** ([`filter`]) - `field|operator|value` tokens into filter entries
//! - **Criteria building** ([`criteria`]) - Filter entries into per-field criteria
//! - **Queries** ([`query`]) - The store-ready query model and its visitor trait
//! - **Execution** ([`executor`]) - Paged retrieval and distinct values
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing storage backends
//! - **Collections and stores** ([`collection`], [`store`]) - High-level API
//! - **Pagination** ([`page`]) - Page requests and page results
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use docfilter_core::{criteria::CriteriaBuilder, filter::FilterParser};
//!
//! let filters = FilterParser::default()
//!     .parse(["room|gte|100", "room|lt|200", "name|eq|Alice"], &schema)?;
//! let query = CriteriaBuilder::build(&filters)?;
//!
//! assert_eq!(query.criteria.len(), 2);
//! ```

#[allow(unused_extern_crates)]
extern crate self as docfilter_core;

pub mod backend;
pub mod collection;
pub mod criteria;
pub mod document;
pub mod error;
pub mod executor;
pub mod filter;
pub mod page;
pub mod query;
pub mod schema;
pub mod store;
pub mod value;
