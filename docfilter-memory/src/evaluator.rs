//! Query evaluation for in-memory document filtering.
//!
//! This module provides the evaluation engine that decides whether a BSON document matches
//! a [`Query`], following the comparison rules of a document store:
//!
//! - dotted paths descend through embedded documents;
//! - a field holding an array matches when the array itself or any of its elements does;
//! - numbers compare across integer and floating point widths;
//! - values of different kinds never satisfy a range bound;
//! - `ne` and `nin` match documents where the field is missing.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, Document as BsonDocument, datetime::DateTime, spec::BinarySubtype};
use regex::Regex;

use docfilter_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Criterion, FieldOp, Query, QueryVisitor},
    schema::PATH_SEPARATOR,
};

/// Comparable representation of BSON values.
///
/// Integers keep their exact value and only widen to `f64` when compared with a double.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value of any width
    Int(i64),
    /// Floating point value
    Double(f64),
    /// DateTime value
    DateTime(DateTime),
    /// String value
    String(&'a str),
    /// Binary value, including UUIDs
    Binary(BinarySubtype, &'a [u8]),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Any other value, compared for equality only
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Int(i64::from(*value)),
            Bson::Int64(value) => Comparable::Int(*value),
            Bson::Double(value) => Comparable::Double(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Binary(binary) => Comparable::Binary(binary.subtype, &binary.bytes),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Int(a), Comparable::Int(b)) => a == b,
            (Comparable::Double(a), Comparable::Double(b)) => a == b,
            (Comparable::Int(a), Comparable::Double(b))
            | (Comparable::Double(b), Comparable::Int(a)) => (*a as f64) == *b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Binary(sa, a), Comparable::Binary(sb, b)) => sa == sb && a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Int(b)) => a.partial_cmp(b),
            (Comparable::Double(a), Comparable::Double(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Double(b)) => (*a as f64).partial_cmp(b),
            (Comparable::Double(a), Comparable::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::Binary(sa, a), Comparable::Binary(sb, b)) => {
                (a.len(), u8::from(*sa), *a).partial_cmp(&(b.len(), u8::from(*sb), *b))
            }
            _ => None,
        }
    }
}

/// Looks up a dotted field path in a document.
///
/// Returns `None` if any segment is missing or an intermediate value is not a document.
pub(crate) fn lookup<'a>(document: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split(PATH_SEPARATOR);
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}

/// Regular expressions of a query, compiled once per query.
#[derive(Debug, Default)]
pub(crate) struct Patterns {
    compiled: HashMap<String, Regex>,
}

impl Patterns {
    /// Compiles every `regex` clause of `query`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Backend`] if a pattern is not a string or does not compile.
    pub fn compile(query: &Query) -> DocumentStoreResult<Self> {
        let mut compiled = HashMap::new();

        for criterion in &query.criteria {
            let Some(pattern) = criterion.clause(FieldOp::Regex) else {
                continue;
            };

            let pattern = pattern.as_str().ok_or_else(|| {
                DocumentStoreError::Backend(format!(
                    "regex on `{}` must be a string, got {pattern}",
                    criterion.field()
                ))
            })?;

            if !compiled.contains_key(pattern) {
                let regex = Regex::new(pattern)
                    .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;
                compiled.insert(pattern.to_string(), regex);
            }
        }

        Ok(Self { compiled })
    }

    fn get(&self, pattern: &str) -> Option<&Regex> {
        self.compiled.get(pattern)
    }
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a BsonDocument,
    patterns: &'a Patterns,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a BsonDocument, patterns: &'a Patterns) -> Self {
        Self { document, patterns }
    }

    pub fn evaluate(&mut self, query: &Query) -> DocumentStoreResult<bool> {
        self.visit_query(query)
    }

    /// Returns the documents matching every criterion of `query`, in their original order.
    ///
    /// Values that are not documents never match.
    pub fn filter_documents<'d>(
        documents: impl IntoIterator<Item = &'d Bson>,
        query: &Query,
    ) -> DocumentStoreResult<Vec<&'d Bson>> {
        let patterns = Patterns::compile(query)?;
        let mut matching = Vec::new();

        for bson in documents {
            let Some(document) = bson.as_document() else {
                continue;
            };

            if DocumentEvaluator::new(document, &patterns).evaluate(query)? {
                matching.push(bson);
            }
        }

        Ok(matching)
    }

    fn matches(&self, field_value: &Bson, op: FieldOp, value: &Bson) -> DocumentStoreResult<bool> {
        Ok(match op {
            FieldOp::Eq => any_candidate(field_value, |candidate| candidate == Comparable::from(value)),
            FieldOp::Ne => !self.matches(field_value, FieldOp::Eq, value)?,
            FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
                let bound = Comparable::from(value);
                any_candidate(field_value, |candidate| {
                    match candidate.partial_cmp(&bound) {
                        Some(ordering) => match op {
                            FieldOp::Gt => ordering == Ordering::Greater,
                            FieldOp::Gte => ordering != Ordering::Less,
                            FieldOp::Lt => ordering == Ordering::Less,
                            _ => ordering != Ordering::Greater,
                        },
                        None => false,
                    }
                })
            }
            FieldOp::In => {
                let values = members(value);
                any_candidate(field_value, |candidate| {
                    values.iter().any(|member| Comparable::from(*member) == candidate)
                })
            }
            FieldOp::Nin => !self.matches(field_value, FieldOp::In, value)?,
            FieldOp::Regex => {
                let regex = value
                    .as_str()
                    .and_then(|pattern| self.patterns.get(pattern))
                    .ok_or_else(|| {
                        DocumentStoreError::Backend(format!("regex {value} was not compiled"))
                    })?;

                any_candidate(field_value, |candidate| match candidate {
                    Comparable::String(text) => regex.is_match(text),
                    _ => false,
                })
            }
        })
    }
}

/// Tests `predicate` against the value and, for arrays, each of its elements.
fn any_candidate(value: &Bson, mut predicate: impl FnMut(Comparable<'_>) -> bool) -> bool {
    if predicate(Comparable::from(value)) {
        return true;
    }

    match value {
        Bson::Array(items) => items
            .iter()
            .any(|item| predicate(Comparable::from(item))),
        _ => false,
    }
}

fn members(value: &Bson) -> Vec<&Bson> {
    match value {
        Bson::Array(items) => items.iter().collect(),
        single => vec![single],
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, criteria: &[Criterion]) -> Result<Self::Output, Self::Error> {
        for criterion in criteria {
            if !self.visit_criterion(criterion)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_criterion(&mut self, criterion: &Criterion) -> Result<Self::Output, Self::Error> {
        let field_value = lookup(self.document, criterion.field());

        for (op, value) in criterion.clauses() {
            let matched = match field_value {
                Some(field_value) => self.matches(field_value, *op, value)?,
                None => matches!(op, FieldOp::Ne | FieldOp::Nin),
            };

            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }
}
