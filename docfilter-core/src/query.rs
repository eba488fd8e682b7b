//! Store-ready query representation.
//!
//! A [`Query`] is a conjunction of per-field [`Criterion`] values plus optional pagination
//! and sort settings. Each criterion holds every operator clause that applies to its
//! field, so `room > 10 AND room < 20` is one criterion with two clauses rather than two
//! criteria on the same field.
//!
//! Backends consume queries through the [`QueryVisitor`] trait.
//!
//! # Query Building
//!
//! Queries are usually produced by the [`CriteriaBuilder`](crate::criteria::CriteriaBuilder)
//! from parsed filter tokens, but can also be constructed with the fluent builder API:
//!
//! ```ignore
//! use docfilter_core::query::{Query, Filter, SortDirection};
//!
//! let query = Query::builder()
//!     .criterion(Filter::gte("room", 100).and(FieldOp::Lt, 200))
//!     .criterion(Filter::eq("name", "Alice"))
//!     .limit(10)
//!     .offset(0)
//!     .sort("checkIn", SortDirection::Desc)
//!     .build();
//! ```

use std::fmt;

use bson::Bson;

use crate::{error::DocumentStoreError, page::PaginationParams};

/// Sort direction for query results.
#[derive(Debug, Clone, PartialEq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

/// Sort specification for query results.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    /// The field path to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// Store-side comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldOp {
    /// Equal to.
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// Field value is one of the values of an array.
    In,
    /// Field value is none of the values of an array.
    Nin,
    /// Field text matches a regular expression.
    Regex,
}

impl FieldOp {
    /// Returns `true` for range bounds.
    pub fn is_range(self) -> bool {
        matches!(self, FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte)
    }
}

impl fmt::Display for FieldOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldOp::Eq => "eq",
            FieldOp::Ne => "ne",
            FieldOp::Gt => "gt",
            FieldOp::Gte => "gte",
            FieldOp::Lt => "lt",
            FieldOp::Lte => "lte",
            FieldOp::In => "in",
            FieldOp::Nin => "nin",
            FieldOp::Regex => "regex",
        })
    }
}

/// All constraints on a single field, conjoined.
///
/// Each operator appears at most once. Adding a clause for an operator that is already
/// present replaces its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    field: String,
    clauses: Vec<(FieldOp, Bson)>,
}

impl Criterion {
    /// Creates a criterion with a single clause.
    pub fn new(field: impl Into<String>, op: FieldOp, value: impl Into<Bson>) -> Self {
        Self {
            field: field.into(),
            clauses: vec![(op, value.into())],
        }
    }

    /// Adds a clause to this criterion.
    pub fn and(mut self, op: FieldOp, value: impl Into<Bson>) -> Self {
        self.add_clause(op, value.into());
        self
    }

    /// Adds a clause in place, replacing an existing clause with the same operator.
    pub fn add_clause(&mut self, op: FieldOp, value: Bson) {
        match self.clauses.iter_mut().find(|(existing, _)| *existing == op) {
            Some((_, existing)) => *existing = value,
            None => self.clauses.push((op, value)),
        }
    }

    /// Returns the field path this criterion constrains.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the clauses in the order they were added.
    pub fn clauses(&self) -> &[(FieldOp, Bson)] {
        &self.clauses
    }

    /// Returns the value of the clause with the given operator.
    pub fn clause(&self, op: FieldOp) -> Option<&Bson> {
        self.clauses
            .iter()
            .find(|(existing, _)| *existing == op)
            .map(|(_, value)| value)
    }
}

/// A structured query for retrieving and filtering documents.
///
/// All criteria must match. At most one criterion exists per field path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Per-field criteria, conjoined.
    pub criteria: Vec<Criterion>,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
    /// Number of documents to skip (for pagination).
    pub offset: Option<usize>,
    /// Sort specification for results.
    pub sort: Option<Sort>,
}

impl Query {
    /// Creates a new query that matches every document.
    pub fn new() -> Self {
        Query {
            criteria: Vec::new(),
            limit: None,
            offset: None,
            sort: None,
        }
    }

    /// Creates a new query builder for fluent construction.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Returns the criterion on the given field path.
    pub fn criterion(&self, field: &str) -> Option<&Criterion> {
        self.criteria
            .iter()
            .find(|criterion| criterion.field == field)
    }

    /// Returns this query with limit and offset removed.
    pub fn unpaged(mut self) -> Self {
        self.limit = None;
        self.offset = None;
        self
    }
}

/// Helper struct for constructing single-clause criteria.
///
/// # Example
///
/// ```ignore
/// use docfilter_core::query::{Filter, FieldOp};
///
/// let room = Filter::gt("room", 10).and(FieldOp::Lt, 20);
/// ```
pub struct Filter;

impl Filter {
    /// Matches documents where the field equals the value.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Criterion {
        Criterion::new(field, FieldOp::Eq, value)
    }

    /// Matches documents where the field does not equal the value.
    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Criterion {
        Criterion::new(field, FieldOp::Ne, value)
    }

    /// Matches documents where the field is greater than the value.
    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Criterion {
        Criterion::new(field, FieldOp::Gt, value)
    }

    /// Matches documents where the field is greater than or equal to the value.
    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Criterion {
        Criterion::new(field, FieldOp::Gte, value)
    }

    /// Matches documents where the field is less than the value.
    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Criterion {
        Criterion::new(field, FieldOp::Lt, value)
    }

    /// Matches documents where the field is less than or equal to the value.
    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Criterion {
        Criterion::new(field, FieldOp::Lte, value)
    }

    /// Matches documents where the field equals any of the values.
    pub fn any_of(field: impl Into<String>, values: impl IntoIterator<Item = impl Into<Bson>>) -> Criterion {
        Criterion::new(field, FieldOp::In, Bson::Array(values.into_iter().map(Into::into).collect()))
    }

    /// Matches documents where the field equals none of the values.
    pub fn none_of(field: impl Into<String>, values: impl IntoIterator<Item = impl Into<Bson>>) -> Criterion {
        Criterion::new(field, FieldOp::Nin, Bson::Array(values.into_iter().map(Into::into).collect()))
    }

    /// Matches documents where the string field matches the pattern.
    pub fn regex(field: impl Into<String>, pattern: impl Into<String>) -> Criterion {
        Criterion::new(field, FieldOp::Regex, Bson::String(pattern.into()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Creates a new query builder.
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Adds a criterion. A criterion on a field that already has one replaces it.
    pub fn criterion(mut self, criterion: Criterion) -> Self {
        match self
            .query
            .criteria
            .iter_mut()
            .find(|existing| existing.field == criterion.field)
        {
            Some(existing) => *existing = criterion,
            None => self.query.criteria.push(criterion),
        }
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Sets the number of documents to skip.
    pub fn offset(mut self, offset: usize) -> Self {
        self.query.offset = Some(offset);
        self
    }

    /// Sets limit and offset from pagination parameters.
    pub fn paginate(self, params: &PaginationParams) -> Self {
        self.offset(params.offset()).limit(params.size)
    }

    /// Sets the sort specification for the query results.
    ///
    /// # Arguments
    ///
    /// * `field` - The field path to sort by
    /// * `direction` - The sort direction (ascending or descending)
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort = Some(Sort { field: field.into(), direction });
        self
    }

    /// Builds and returns the final query.
    pub fn build(self) -> Query {
        self.query
    }
}

impl From<Query> for QueryBuilder {
    fn from(query: Query) -> Self {
        QueryBuilder { query }
    }
}

/// Translates or evaluates a [`Query`].
///
/// Implemented once per backend. Criteria are always conjoined.
pub trait QueryVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    fn visit_and(&mut self, criteria: &[Criterion]) -> Result<Self::Output, Self::Error>;
    fn visit_criterion(&mut self, criterion: &Criterion) -> Result<Self::Output, Self::Error>;

    fn visit_query(&mut self, query: &Query) -> Result<Self::Output, Self::Error> {
        self.visit_and(&query.criteria)
    }
}
