//! Schema descriptors and field path resolution.
//!
//! A [`SchemaDescriptor`] lists the fields of a document type and the declared type of each
//! field. Descriptors are built once, either at compile time through
//! `#[derive(Filterable)]` or at startup with [`SchemaDescriptor::builder`], and are never
//! mutated afterwards. Filter parsing only ever reads them.
//!
//! Nested document types are referenced through [`SchemaRef`], which allows a schema to
//! point at itself (an employee with a manager who is an employee). Resolution walks one
//! path segment per step, so it always terminates on the length of the client-supplied path.
//!
//! # Example
//!
//! ```ignore
//! use docfilter_core::{schema::SchemaDescriptor, value::ScalarType};
//!
//! let address = SchemaDescriptor::builder("Address")
//!     .scalar("city", ScalarType::String)
//!     .build();
//!
//! let booking = SchemaDescriptor::builder("Booking")
//!     .scalar("room", ScalarType::Int32)
//!     .nested("address", address)
//!     .build();
//!
//! assert_eq!(booking.resolve("address.city")?, ScalarType::String);
//! ```

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc,
};

use bson::{Bson, Document as BsonDocument, Uuid};

use crate::{
    error::{FilterError, FilterResult},
    value::ScalarType,
};

/// Separator between the segments of a field path.
pub const PATH_SEPARATOR: char = '.';

/// A reference to a nested schema.
#[derive(Clone)]
pub enum SchemaRef {
    /// A schema produced by a function, typically [`Filterable::schema`]. The function is only
    /// called when the reference is followed.
    Static(fn() -> &'static SchemaDescriptor),
    /// A schema built at runtime.
    Shared(Arc<SchemaDescriptor>),
}

impl SchemaRef {
    /// Returns a reference to the schema of `T`.
    pub fn of<T: Filterable>() -> Self {
        SchemaRef::Static(T::schema)
    }

    /// Follows the reference.
    pub fn get(&self) -> &SchemaDescriptor {
        match self {
            SchemaRef::Static(schema) => schema(),
            SchemaRef::Shared(schema) => schema,
        }
    }
}

impl fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SchemaRef")
            .field(&self.get().name())
            .finish()
    }
}

impl From<SchemaDescriptor> for SchemaRef {
    fn from(schema: SchemaDescriptor) -> Self {
        SchemaRef::Shared(Arc::new(schema))
    }
}

impl From<Arc<SchemaDescriptor>> for SchemaRef {
    fn from(schema: Arc<SchemaDescriptor>) -> Self {
        SchemaRef::Shared(schema)
    }
}

/// The declared type of a schema field.
#[derive(Debug, Clone)]
pub enum FieldType {
    /// A primitive value that can be coerced from filter text.
    Scalar(ScalarType),
    /// A nested document whose fields can be addressed with a dotted path.
    Nested(SchemaRef),
    /// A composite value without a converter, such as an array or a map.
    Unsupported(String),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(scalar_type) => write!(f, "{scalar_type}"),
            FieldType::Nested(schema) => f.write_str(schema.get().name()),
            FieldType::Unsupported(name) => f.write_str(name),
        }
    }
}

/// Field names and declared types of one document type.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    name: String,
    fields: Vec<(String, FieldType)>,
}

impl SchemaDescriptor {
    /// Creates a new builder for a schema with the given type name.
    pub fn builder(name: impl Into<String>) -> SchemaDescriptorBuilder {
        SchemaDescriptorBuilder::new(name)
    }

    /// Returns the type name of this schema.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type of a direct field.
    pub fn field(&self, name: &str) -> Option<&FieldType> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, field_type)| field_type)
    }

    /// Iterates over the direct fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldType)> {
        self.fields
            .iter()
            .map(|(name, field_type)| (name.as_str(), field_type))
    }

    /// Resolves a dotted field path to the declared type of its terminal field.
    ///
    /// Every segment except the last must name a nested document field.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnknownField`] if a segment does not exist on the schema level
    /// it is looked up in, including when an earlier segment is not a nested document.
    pub fn resolve_field(&self, path: &str) -> FilterResult<&FieldType> {
        let mut schema = self;
        let mut segments = path.split(PATH_SEPARATOR).peekable();

        while let Some(segment) = segments.next() {
            let field_type = schema
                .field(segment)
                .ok_or_else(|| FilterError::UnknownField {
                    path: path.to_string(),
                    segment: segment.to_string(),
                    schema: schema.name.clone(),
                })?;

            let Some(next) = segments.peek() else {
                return Ok(field_type);
            };

            schema = match field_type {
                FieldType::Nested(nested) => nested.get(),
                other => {
                    return Err(FilterError::UnknownField {
                        path: path.to_string(),
                        segment: next.to_string(),
                        schema: other.to_string(),
                    });
                }
            };
        }

        // `split` always yields at least one segment.
        Err(FilterError::UnknownField {
            path: path.to_string(),
            segment: String::new(),
            schema: self.name.clone(),
        })
    }

    /// Resolves a dotted field path to the scalar type of its terminal field.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnknownField`] as [`resolve_field`](Self::resolve_field) does,
    /// and [`FilterError::UnsupportedFieldType`] if the terminal field is not a scalar.
    pub fn resolve(&self, path: &str) -> FilterResult<ScalarType> {
        match self.resolve_field(path)? {
            FieldType::Scalar(scalar_type) => Ok(*scalar_type),
            other => Err(FilterError::UnsupportedFieldType {
                path: path.to_string(),
                type_name: other.to_string(),
            }),
        }
    }
}

/// Builder for [`SchemaDescriptor`].
pub struct SchemaDescriptorBuilder {
    name: String,
    fields: Vec<(String, FieldType)>,
}

impl SchemaDescriptorBuilder {
    /// Creates a builder with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field with an explicit type. A field added twice keeps the later type.
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();

        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, existing)) => *existing = field_type,
            None => self.fields.push((name, field_type)),
        }

        self
    }

    /// Adds a scalar field.
    pub fn scalar(self, name: impl Into<String>, scalar_type: ScalarType) -> Self {
        self.field(name, FieldType::Scalar(scalar_type))
    }

    /// Adds a nested document field.
    pub fn nested(self, name: impl Into<String>, schema: impl Into<SchemaRef>) -> Self {
        self.field(name, FieldType::Nested(schema.into()))
    }

    /// Adds a field that exists but cannot be filtered on.
    pub fn unsupported(self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.field(name, FieldType::Unsupported(type_name.into()))
    }

    /// Builds and returns the final [`SchemaDescriptor`].
    pub fn build(self) -> SchemaDescriptor {
        SchemaDescriptor {
            name: self.name,
            fields: self.fields,
        }
    }
}

/// Types that expose a [`SchemaDescriptor`] for their stored representation.
///
/// Usually implemented with `#[derive(Filterable)]`.
pub trait Filterable {
    /// Returns the process-wide schema of this type.
    fn schema() -> &'static SchemaDescriptor;
}

/// Maps a Rust field type to the [`FieldType`] of its stored representation.
///
/// Used by `#[derive(Filterable)]` for each field of a struct.
pub trait SchemaField {
    /// Returns the declared type of a field of this Rust type.
    fn field_type() -> FieldType;
}

macro_rules! scalar_field {
    ($($ty:ty => $scalar:ident),* $(,)?) => {
        $(
            impl SchemaField for $ty {
                fn field_type() -> FieldType {
                    FieldType::Scalar(ScalarType::$scalar)
                }
            }
        )*
    };
}

scalar_field! {
    String => String,
    i32 => Int32,
    i64 => Int64,
    f32 => Float,
    f64 => Double,
    bool => Boolean,
    bson::DateTime => Timestamp,
    Uuid => Uuid,
}

impl<T: SchemaField> SchemaField for Option<T> {
    fn field_type() -> FieldType {
        T::field_type()
    }
}

impl<T: SchemaField> SchemaField for Box<T> {
    fn field_type() -> FieldType {
        T::field_type()
    }
}

impl<T> SchemaField for Vec<T> {
    fn field_type() -> FieldType {
        FieldType::Unsupported("array".to_string())
    }
}

impl<K, V, S> SchemaField for HashMap<K, V, S> {
    fn field_type() -> FieldType {
        FieldType::Unsupported("map".to_string())
    }
}

impl<K, V> SchemaField for BTreeMap<K, V> {
    fn field_type() -> FieldType {
        FieldType::Unsupported("map".to_string())
    }
}

impl SchemaField for BsonDocument {
    fn field_type() -> FieldType {
        FieldType::Unsupported("document".to_string())
    }
}

impl SchemaField for Bson {
    fn field_type() -> FieldType {
        FieldType::Unsupported("bson".to_string())
    }
}

/// Read-only mapping from a root type identifier to its schema.
///
/// Built once at startup and shared by every request. Untyped collections look up their
/// schema here by collection name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, SchemaRef>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema under the given identifier.
    pub fn register(mut self, name: impl Into<String>, schema: impl Into<SchemaRef>) -> Self {
        self.schemas.insert(name.into(), schema.into());
        self
    }

    /// Registers the schema of `T` under the given identifier.
    pub fn register_type<T: Filterable>(self, name: impl Into<String>) -> Self {
        self.register(name, SchemaRef::of::<T>())
    }

    /// Returns the schema registered under the given identifier.
    pub fn get(&self, name: &str) -> Option<&SchemaDescriptor> {
        self.schemas.get(name).map(SchemaRef::get)
    }

    /// Lists the registered identifiers.
    pub fn names(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }
}
