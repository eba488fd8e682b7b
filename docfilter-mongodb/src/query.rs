//! Query translation from docfilter criteria to MongoDB query syntax.
//!
//! Each criterion becomes one field entry holding all of its operator clauses, so a merged
//! range such as `room >= 100 AND room < 200` renders as
//! `{ "room": { "$gte": 100, "$lt": 200 } }`. Criteria on different fields share the same
//! top-level document, which MongoDB conjoins.

use bson::{Document, doc};

use docfilter_core::{
    error::DocumentStoreError,
    query::{Criterion, FieldOp, QueryVisitor},
};

/// Translates docfilter queries into MongoDB filter documents.
pub(crate) struct MongoQueryTranslator;

fn operator(op: FieldOp) -> &'static str {
    match op {
        FieldOp::Eq => "$eq",
        FieldOp::Ne => "$ne",
        FieldOp::Gt => "$gt",
        FieldOp::Gte => "$gte",
        FieldOp::Lt => "$lt",
        FieldOp::Lte => "$lte",
        FieldOp::In => "$in",
        FieldOp::Nin => "$nin",
        FieldOp::Regex => "$regex",
    }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, criteria: &[Criterion]) -> Result<Self::Output, Self::Error> {
        let mut filter = Document::new();

        for criterion in criteria {
            filter.extend(self.visit_criterion(criterion)?);
        }

        Ok(filter)
    }

    fn visit_criterion(&mut self, criterion: &Criterion) -> Result<Self::Output, Self::Error> {
        let mut clauses = Document::new();

        for (op, value) in criterion.clauses() {
            match (op, value) {
                (FieldOp::In | FieldOp::Nin, value) if value.as_array().is_none() => {
                    return Err(DocumentStoreError::Backend(format!(
                        "{op} on `{}` requires an array value",
                        criterion.field()
                    )));
                }
                (FieldOp::Regex, value) if value.as_str().is_none() => {
                    return Err(DocumentStoreError::Backend(format!(
                        "regex on `{}` requires a string pattern",
                        criterion.field()
                    )));
                }
                _ => {
                    clauses.insert(operator(*op), value.clone());
                }
            }
        }

        Ok(doc! { criterion.field(): clauses })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::Bson;
    use docfilter_core::query::{Filter, Query};

    fn translate(query: &Query) -> Document {
        MongoQueryTranslator.visit_query(query).unwrap()
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert_eq!(translate(&Query::new()), doc! {});
    }

    #[test]
    fn test_merged_range_and_equality() {
        let query = Query::builder()
            .criterion(Filter::gte("room", 100).and(FieldOp::Lt, 200))
            .criterion(Filter::eq("name", "Alice"))
            .build();

        assert_eq!(
            translate(&query),
            doc! {
                "room": { "$gte": 100, "$lt": 200 },
                "name": { "$eq": "Alice" },
            }
        );
    }

    #[test]
    fn test_membership_and_regex() {
        let query = Query::builder()
            .criterion(Filter::any_of("room", [1, 2, 3]))
            .criterion(Filter::none_of("status", ["CANCELLED"]))
            .criterion(Filter::regex("guest.email", "@example\\.com$"))
            .build();

        assert_eq!(
            translate(&query),
            doc! {
                "room": { "$in": [1, 2, 3] },
                "status": { "$nin": ["CANCELLED"] },
                "guest.email": { "$regex": "@example\\.com$" },
            }
        );
    }

    #[test]
    fn test_membership_requires_array() {
        let query = Query::builder()
            .criterion(Criterion::new("room", FieldOp::In, Bson::Int32(1)))
            .build();

        assert!(matches!(
            MongoQueryTranslator.visit_query(&query),
            Err(DocumentStoreError::Backend(_))
        ));
    }
}
