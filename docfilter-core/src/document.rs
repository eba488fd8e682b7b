//! Core traits for document representation and serialization.
//!
//! Every stored type implements [`Document`], which ties it to a collection and, through
//! [`Filterable`], to the schema used to validate filters against it.

use bson::{Bson, Uuid, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Serialize, de::DeserializeOwned};

use crate::{error::DocumentStoreResult, schema::Filterable};

/// Core trait that all documents stored in a document store must implement.
///
/// Every document has a unique identifier and names the collection it belongs to. Its
/// [`Filterable`] schema must describe the same field names its serde representation uses.
///
/// # Example
///
/// ```ignore
/// use docfilter::prelude::*;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize, Filterable)]
/// pub struct Booking {
///     pub id: Uuid,
///     pub name: String,
///     pub room: i32,
/// }
///
/// impl Document for Booking {
///     fn id(&self) -> &Uuid {
///         &self.id
///     }
///
///     fn collection_name() -> &'static str {
///         "bookings"
///     }
/// }
/// ```
pub trait Document: Filterable + Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// Returns a reference to this document's unique identifier.
    fn id(&self) -> &Uuid;

    /// Returns the name of the collection this document belongs to.
    fn collection_name() -> &'static str;
}

/// Extension trait providing BSON conversion for documents.
///
/// This trait is automatically implemented for all types that implement [`Document`].
pub trait DocumentExt: Document {
    /// Converts this document to a BSON value for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn to_bson(&self) -> DocumentStoreResult<Bson>;

    /// Creates a document from a BSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_bson(bson: Bson) -> DocumentStoreResult<Self>;
}

impl<D: Document> DocumentExt for D {
    fn to_bson(&self) -> DocumentStoreResult<Bson> {
        Ok(serialize_to_bson(self)?)
    }

    fn from_bson(bson: Bson) -> DocumentStoreResult<Self> {
        Ok(deserialize_from_bson(bson)?)
    }
}
