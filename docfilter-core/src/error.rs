//! Error types and result types for filter parsing and document store operations.
//!
//! Two layers of errors exist:
//!
//! - [`FilterError`] covers everything that can go wrong while turning raw filter tokens
//!   into a [`Query`](crate::query::Query). These are client-input errors.
//! - [`DocumentStoreError`] is returned by every store operation and wraps [`FilterError`]
//!   alongside backend, serialization and pagination failures.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

use crate::value::ScalarType;

/// Errors raised while parsing filter tokens, resolving field paths, coercing values
/// or building query criteria.
///
/// Every variant describes a problem with the request being processed. None of them are
/// retried and no partial result is ever produced alongside one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// The token does not have the `field|operator|value` shape.
    #[error("Filter `{0}` is not in the format field|operator|value")]
    Malformed(String),
    /// A segment of the field path does not exist on the schema level it was looked up in.
    #[error("Unknown field `{segment}` in path `{path}` of {schema}")]
    UnknownField {
        /// The full dotted path supplied by the client.
        path: String,
        /// The segment that could not be found.
        segment: String,
        /// Name of the schema the segment was looked up in.
        schema: String,
    },
    /// The terminal field exists but its type has no text converter.
    #[error("Filtering not supported for field `{path}` of type {type_name}")]
    UnsupportedFieldType {
        /// The full dotted path supplied by the client.
        path: String,
        /// Descriptive name of the field's declared type.
        type_name: String,
    },
    /// The operator text does not name a known operator.
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),
    /// The value text cannot be converted to the field's scalar type.
    #[error("Cannot convert `{value}` to {target}: {reason}")]
    Coercion {
        /// The raw value text.
        value: String,
        /// The scalar type the value was coerced against.
        target: ScalarType,
        /// Why the conversion failed.
        reason: String,
    },
    /// A filter entry reached the criteria builder in a shape the parser never produces.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// A specialized `Result` type for filter parsing and criteria building.
pub type FilterResult<T> = Result<T, FilterError>;

/// Represents all possible errors that can occur when interacting with a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during store initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// A document with the given ID already exists in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document {0} already exists in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// The document violates schema constraints or has invalid structure.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// The requested page size or page index cannot be served.
    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),
    /// The filter tokens of the request were rejected.
    #[error(transparent)]
    Filter(#[from] FilterError),
    /// An error occurred in the underlying storage backend. The message is the backend's own.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl DocumentStoreError {
    /// Returns `true` when the error was caused by the request rather than by the store.
    ///
    /// Callers exposing the store over a network boundary use this to pick between a
    /// client-facing rejection and a server failure.
    pub fn is_client_error(&self) -> bool {
        match self {
            DocumentStoreError::Filter(FilterError::InvariantViolation(_)) => false,
            DocumentStoreError::Filter(_) | DocumentStoreError::InvalidPagination(_) => true,
            _ => false,
        }
    }
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_errors_are_client_errors() {
        let err: DocumentStoreError = FilterError::UnknownOperator("like".into()).into();
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Unknown operator: like");
    }

    #[test]
    fn test_invariant_violation_is_not_client_error() {
        let err: DocumentStoreError = FilterError::InvariantViolation("set for eq".into()).into();
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_backend_error_is_not_client_error() {
        let err = DocumentStoreError::Backend("connection reset".into());
        assert!(!err.is_client_error());
        assert_eq!(err.to_string(), "Backend error: connection reset");
    }

    #[test]
    fn test_coercion_error_message() {
        let err = FilterError::Coercion {
            value: "abc".into(),
            target: ScalarType::Int32,
            reason: "invalid digit found in string".into(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot convert `abc` to int32: invalid digit found in string"
        );
    }
}
