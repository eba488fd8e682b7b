//! Conversion of parsed filters into query criteria.
//!
//! Each [`FilterEntry`] becomes one operator clause on its field. Clauses on the same field
//! combine as follows:
//!
//! - a range bound (`gt`, `gte`, `lt`, `lte`) joins the criterion already present for the
//!   field, so `room|gt|10` and `room|lt|20` produce a single `10 < room < 20` criterion;
//! - any other operator replaces the field's criterion, so the last `eq`, `ne`, `in`, `nin`
//!   or `regex` entry for a field wins.

use std::collections::HashMap;

use bson::Bson;
use tracing::debug;

use crate::{
    error::{FilterError, FilterResult},
    filter::{FilterEntry, FilterSet, FilterValue, OperatorKind},
    query::{Criterion, FieldOp, Query},
};

/// Builds a [`Query`] from a [`FilterSet`].
///
/// Every call owns its own field-to-criterion map, so concurrent builds never share state.
#[derive(Debug, Clone, Copy, Default)]
pub struct CriteriaBuilder;

impl CriteriaBuilder {
    /// Builds the conjunction of all entries. Pagination is left unset.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvariantViolation`] if an entry's value does not fit its
    /// operator: a set for a single-valued operator, a single value for `in`/`nin`, or a
    /// non-text `regex` value. The parser never produces such entries.
    pub fn build(filters: &FilterSet) -> FilterResult<Query> {
        let mut criteria: Vec<Criterion> = Vec::with_capacity(filters.len());
        let mut positions: HashMap<&str, usize> = HashMap::new();

        for entry in filters {
            let (op, value) = Self::clause(entry)?;

            match positions.get(entry.field_path.as_str()) {
                Some(&index) if op.is_range() => criteria[index].add_clause(op, value),
                Some(&index) => criteria[index] = Criterion::new(&entry.field_path, op, value),
                None => {
                    positions.insert(&entry.field_path, criteria.len());
                    criteria.push(Criterion::new(&entry.field_path, op, value));
                }
            }
        }

        debug!(
            target: "docfilter::criteria",
            filters = filters.len(),
            criteria = criteria.len(),
            "Built query criteria"
        );

        Ok(Query {
            criteria,
            ..Query::new()
        })
    }

    fn clause(entry: &FilterEntry) -> FilterResult<(FieldOp, Bson)> {
        let op = match entry.operator {
            OperatorKind::Eq => FieldOp::Eq,
            OperatorKind::Ne => FieldOp::Ne,
            OperatorKind::Gt => FieldOp::Gt,
            OperatorKind::Gte => FieldOp::Gte,
            OperatorKind::Lt => FieldOp::Lt,
            OperatorKind::Lte => FieldOp::Lte,
            OperatorKind::In => FieldOp::In,
            OperatorKind::Nin => FieldOp::Nin,
            OperatorKind::Regex => FieldOp::Regex,
        };

        let value = match (&entry.value, entry.operator.is_multi_valued()) {
            (FilterValue::Set(values), true) => {
                Bson::Array(values.iter().cloned().map(Bson::from).collect())
            }
            (FilterValue::Single(value), false) => {
                if op == FieldOp::Regex && value.as_str().is_none() {
                    return Err(FilterError::InvariantViolation(format!(
                        "regex on `{}` requires a string pattern, got {}",
                        entry.field_path,
                        value.scalar_type()
                    )));
                }
                Bson::from(value.clone())
            }
            (FilterValue::Single(_), true) => {
                return Err(FilterError::InvariantViolation(format!(
                    "operator {} on `{}` requires a set of values",
                    entry.operator, entry.field_path
                )));
            }
            (FilterValue::Set(_), false) => {
                return Err(FilterError::InvariantViolation(format!(
                    "operator {} on `{}` requires a single value",
                    entry.operator, entry.field_path
                )));
            }
        };

        Ok((op, value))
    }
}
