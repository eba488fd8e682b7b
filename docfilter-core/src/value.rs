//! Scalar types and the text-to-value coercion registry.
//!
//! Every field that can appear at the end of a filter path has a [`ScalarType`]. The
//! registry is closed: a type participates in filtering only if it has a variant here and
//! a converter in [`ScalarType::coerce`]. Composite values (arrays, maps, nested
//! documents) never get a converter, filters on them are rejected by the resolver instead.
//!
//! # Example
//!
//! ```ignore
//! use docfilter_core::value::{ScalarType, TypedValue};
//!
//! let value = ScalarType::Int32.coerce("42")?;
//! assert_eq!(value, TypedValue::Int32(42));
//! ```

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use bson::{Bson, Uuid};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};

/// Primitive value types eligible for text coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// UTF-8 text, taken verbatim.
    String,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// `true` or `false`.
    Boolean,
    /// A point in time, stored as a BSON datetime.
    Timestamp,
    /// A UUID, stored as BSON binary subtype 4.
    Uuid,
}

type Converter = fn(&str) -> Result<TypedValue, String>;

impl ScalarType {
    /// Converts `text` into a value of this type.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Coercion`] if the text is not a valid literal of this type.
    pub fn coerce(self, text: &str) -> FilterResult<TypedValue> {
        (self.converter())(text).map_err(|reason| FilterError::Coercion {
            value: text.to_string(),
            target: self,
            reason,
        })
    }

    /// Returns `true` for types whose values are text.
    pub fn is_textual(self) -> bool {
        matches!(self, ScalarType::String)
    }

    fn converter(self) -> Converter {
        match self {
            ScalarType::String => to_string,
            ScalarType::Int32 => to_int32,
            ScalarType::Int64 => to_int64,
            ScalarType::Float => to_float,
            ScalarType::Double => to_double,
            ScalarType::Boolean => to_boolean,
            ScalarType::Timestamp => to_timestamp,
            ScalarType::Uuid => to_uuid,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScalarType::String => "string",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
            ScalarType::Boolean => "boolean",
            ScalarType::Timestamp => "timestamp",
            ScalarType::Uuid => "uuid",
        })
    }
}

/// Converts `text` into a value of `scalar_type`.
///
/// Shorthand for [`ScalarType::coerce`].
pub fn coerce(scalar_type: ScalarType, text: &str) -> FilterResult<TypedValue> {
    scalar_type.coerce(text)
}

fn to_string(text: &str) -> Result<TypedValue, String> {
    Ok(TypedValue::String(text.to_string()))
}

fn to_int32(text: &str) -> Result<TypedValue, String> {
    text.parse()
        .map(TypedValue::Int32)
        .map_err(|e: std::num::ParseIntError| e.to_string())
}

fn to_int64(text: &str) -> Result<TypedValue, String> {
    text.parse()
        .map(TypedValue::Int64)
        .map_err(|e: std::num::ParseIntError| e.to_string())
}

fn to_float(text: &str) -> Result<TypedValue, String> {
    text.parse()
        .map(TypedValue::Float)
        .map_err(|e: std::num::ParseFloatError| e.to_string())
}

fn to_double(text: &str) -> Result<TypedValue, String> {
    text.parse()
        .map(TypedValue::Double)
        .map_err(|e: std::num::ParseFloatError| e.to_string())
}

fn to_boolean(text: &str) -> Result<TypedValue, String> {
    if text.eq_ignore_ascii_case("true") {
        Ok(TypedValue::Boolean(true))
    } else if text.eq_ignore_ascii_case("false") {
        Ok(TypedValue::Boolean(false))
    } else {
        Err("expected `true` or `false`".to_string())
    }
}

// Local date-times without an offset are read as UTC. Stores keep millisecond precision,
// so finer fractions are rejected rather than truncated.
fn to_timestamp(text: &str) -> Result<TypedValue, String> {
    let datetime = match DateTime::parse_from_rfc3339(text) {
        Ok(datetime) => datetime.with_timezone(&Utc),
        Err(_) => NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M"))
            .map(|naive| naive.and_utc())
            .map_err(|e| e.to_string())?,
    };

    if datetime.timestamp_subsec_nanos() % 1_000_000 != 0 {
        return Err("precision finer than milliseconds is not supported".to_string());
    }

    Ok(TypedValue::Timestamp(datetime))
}

fn to_uuid(text: &str) -> Result<TypedValue, String> {
    Uuid::parse_str(text)
        .map(TypedValue::Uuid)
        .map_err(|e| e.to_string())
}

/// A coerced filter value.
///
/// Equality is total: floating point values compare by bit pattern, so `NaN == NaN` and
/// values can be collected into sets.
#[derive(Debug, Clone)]
pub enum TypedValue {
    String(String),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
}

impl TypedValue {
    /// Returns the scalar type this value belongs to.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            TypedValue::String(_) => ScalarType::String,
            TypedValue::Int32(_) => ScalarType::Int32,
            TypedValue::Int64(_) => ScalarType::Int64,
            TypedValue::Float(_) => ScalarType::Float,
            TypedValue::Double(_) => ScalarType::Double,
            TypedValue::Boolean(_) => ScalarType::Boolean,
            TypedValue::Timestamp(_) => ScalarType::Timestamp,
            TypedValue::Uuid(_) => ScalarType::Uuid,
        }
    }

    /// Returns the text of a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(value) => Some(value),
            _ => None,
        }
    }
}

impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypedValue::String(a), TypedValue::String(b)) => a == b,
            (TypedValue::Int32(a), TypedValue::Int32(b)) => a == b,
            (TypedValue::Int64(a), TypedValue::Int64(b)) => a == b,
            (TypedValue::Float(a), TypedValue::Float(b)) => a.to_bits() == b.to_bits(),
            (TypedValue::Double(a), TypedValue::Double(b)) => a.to_bits() == b.to_bits(),
            (TypedValue::Boolean(a), TypedValue::Boolean(b)) => a == b,
            (TypedValue::Timestamp(a), TypedValue::Timestamp(b)) => a == b,
            (TypedValue::Uuid(a), TypedValue::Uuid(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TypedValue {}

impl Hash for TypedValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.scalar_type().hash(state);
        match self {
            TypedValue::String(value) => value.hash(state),
            TypedValue::Int32(value) => value.hash(state),
            TypedValue::Int64(value) => value.hash(state),
            TypedValue::Float(value) => value.to_bits().hash(state),
            TypedValue::Double(value) => value.to_bits().hash(state),
            TypedValue::Boolean(value) => value.hash(state),
            TypedValue::Timestamp(value) => value.hash(state),
            TypedValue::Uuid(value) => value.hash(state),
        }
    }
}

/// Formats the value as text that coerces back to an equal value.
impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::String(value) => f.write_str(value),
            TypedValue::Int32(value) => write!(f, "{value}"),
            TypedValue::Int64(value) => write!(f, "{value}"),
            TypedValue::Float(value) => write!(f, "{value}"),
            TypedValue::Double(value) => write!(f, "{value}"),
            TypedValue::Boolean(value) => write!(f, "{value}"),
            TypedValue::Timestamp(value) => {
                f.write_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            TypedValue::Uuid(value) => write!(f, "{value}"),
        }
    }
}

impl From<TypedValue> for Bson {
    fn from(value: TypedValue) -> Self {
        match value {
            TypedValue::String(value) => Bson::String(value),
            TypedValue::Int32(value) => Bson::Int32(value),
            TypedValue::Int64(value) => Bson::Int64(value),
            TypedValue::Float(value) => Bson::Double(f64::from(value)),
            TypedValue::Double(value) => Bson::Double(value),
            TypedValue::Boolean(value) => Bson::Boolean(value),
            TypedValue::Timestamp(value) => Bson::DateTime(bson::DateTime::from_chrono(value)),
            TypedValue::Uuid(value) => Bson::from(value),
        }
    }
}
