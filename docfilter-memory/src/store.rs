//! In-memory storage implementation for document stores.
//!
//! This module provides a simple in-memory backend that keeps each collection's documents
//! in insertion order behind an async-aware read-write lock.

use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use bson::{Bson, Uuid};
use mea::rwlock::RwLock;
use tracing::{debug, warn};

use docfilter_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Query, SortDirection},
};

use crate::evaluator::{Comparable, DocumentEvaluator, lookup};

/// The documents of one collection.
#[derive(Debug, Default)]
struct CollectionData {
    ids: HashSet<Uuid>,
    documents: Vec<Bson>,
}

type StoreMap = HashMap<String, CollectionData>;

/// Thread-safe in-memory document storage backend.
///
/// Every query scans its whole collection. Documents are returned in insertion order
/// unless the query specifies a sort.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data.
///
/// # Example
///
/// ```ignore
/// use docfilter_memory::InMemoryStore;
/// use docfilter::{backend::StoreBackend, query::{Filter, Query}};
/// use bson::{Uuid, Bson, doc};
///
/// let store = InMemoryStore::new();
/// let doc = Bson::Document(doc! { "name": "Alice", "room": 120 });
/// store.insert_documents(vec![(Uuid::new(), doc)], "bookings").await?;
///
/// let query = Query::builder().criterion(Filter::gte("room", 100)).build();
/// assert_eq!(store.count_documents(query, "bookings").await?, 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection name -> documents
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

fn sort_key<'a>(document: &'a Bson, field: &str) -> Comparable<'a> {
    document
        .as_document()
        .and_then(|document| lookup(document, field))
        .map(Comparable::from)
        .unwrap_or(Comparable::Null)
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_documents(&self, documents: Vec<(Uuid, Bson)>, collection: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;
        let data = store
            .entry(collection.to_string())
            .or_default();

        let mut batch = HashSet::with_capacity(documents.len());
        for (id, _) in &documents {
            if data.ids.contains(id) || !batch.insert(*id) {
                warn!(target: "docfilter::memory", collection, %id, "Rejected insert of duplicate document");
                return Err(DocumentStoreError::DocumentAlreadyExists(id.to_string(), collection.to_string()));
            }
        }

        let inserted = documents.len();
        for (id, doc) in documents {
            data.ids.insert(id);
            data.documents.push(doc);
        }

        debug!(target: "docfilter::memory", collection, inserted, "Inserted documents");

        Ok(())
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let Some(data) = store.get(collection) else {
            return Ok(vec![]);
        };

        let mut matching = DocumentEvaluator::filter_documents(&data.documents, &query)?;

        if let Some(sort) = &query.sort {
            matching.sort_by(|a, b| {
                let left = sort_key(a, &sort.field);
                let right = sort_key(b, &sort.field);

                match sort.direction {
                    SortDirection::Asc => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
                    SortDirection::Desc => right.partial_cmp(&left).unwrap_or(Ordering::Equal),
                }
            });
        }

        Ok(
            matching
                .into_iter()
                .skip(query.offset.unwrap_or(0))
                .take(query.limit.unwrap_or(usize::MAX))
                .cloned()
                .collect()
        )
    }

    async fn count_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<u64> {
        let store = self.store.read().await;
        let Some(data) = store.get(collection) else {
            return Ok(0);
        };

        Ok(DocumentEvaluator::filter_documents(&data.documents, &query)?.len() as u64)
    }

    async fn distinct_values(&self, query: Query, collection: &str, field: &str) -> DocumentStoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let Some(data) = store.get(collection) else {
            return Ok(vec![]);
        };

        let mut distinct: Vec<&Bson> = Vec::new();
        let values = DocumentEvaluator::filter_documents(&data.documents, &query)?
            .into_iter()
            .filter_map(|document| document.as_document().and_then(|document| lookup(document, field)))
            .flat_map(|value| match value {
                Bson::Array(items) => items.iter().collect::<Vec<_>>(),
                single => vec![single],
            });

        for value in values {
            let candidate = Comparable::from(value);
            if !distinct.iter().any(|seen| Comparable::from(*seen) == candidate) {
                distinct.push(value);
            }
        }

        Ok(distinct.into_iter().cloned().collect())
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use docfilter_memory::InMemoryStore;
/// use docfilter::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder().build().await?;
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds and returns a new [`InMemoryStore`] instance.
    ///
    /// This always succeeds and returns a freshly initialized store.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docfilter_core::query::{FieldOp, Filter};

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::builder().build().await.unwrap();
        let bookings = [
            doc! { "name": "Alice", "room": 120, "status": "CONFIRMED", "tags": ["vip"] },
            doc! { "name": "Bob", "room": 101, "status": "PENDING", "tags": ["vip", "late"] },
            doc! { "name": "Carol", "room": 250, "status": "CONFIRMED" },
            doc! { "name": "Dave", "room": 120, "status": "CANCELLED", "tags": [] },
        ];

        store
            .insert_documents(
                bookings
                    .into_iter()
                    .map(|booking| (Uuid::new(), Bson::Document(booking)))
                    .collect(),
                "bookings",
            )
            .await
            .unwrap();

        store
    }

    fn names(documents: &[Bson]) -> Vec<&str> {
        documents
            .iter()
            .filter_map(|document| document.as_document()?.get_str("name").ok())
            .collect()
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_ids() {
        let store = InMemoryStore::new();
        let id = Uuid::new();

        store
            .insert_documents(vec![(id, Bson::Document(doc! { "name": "Alice" }))], "bookings")
            .await
            .unwrap();

        let result = store
            .insert_documents(
                vec![
                    (Uuid::new(), Bson::Document(doc! { "name": "Bob" })),
                    (id, Bson::Document(doc! { "name": "Alice" })),
                ],
                "bookings",
            )
            .await;

        assert!(matches!(result, Err(DocumentStoreError::DocumentAlreadyExists(_, _))));
        assert_eq!(store.count_documents(Query::new(), "bookings").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_query_filters_in_insertion_order() {
        let store = seeded().await;
        let query = Query::builder()
            .criterion(Filter::gte("room", 100).and(FieldOp::Lt, 200))
            .build();

        let documents = store.query_documents(query, "bookings").await.unwrap();
        assert_eq!(names(&documents), vec!["Alice", "Bob", "Dave"]);
    }

    #[tokio::test]
    async fn test_query_sorts_then_pages() {
        let store = seeded().await;
        let query = Query::builder()
            .sort("room", SortDirection::Desc)
            .offset(1)
            .limit(2)
            .build();

        let documents = store.query_documents(query, "bookings").await.unwrap();
        assert_eq!(names(&documents), vec!["Alice", "Dave"]);
    }

    #[tokio::test]
    async fn test_count_ignores_nothing_but_criteria() {
        let store = seeded().await;
        let query = Query::builder()
            .criterion(Filter::eq("status", "CONFIRMED"))
            .build();

        assert_eq!(store.count_documents(query, "bookings").await.unwrap(), 2);
        assert_eq!(store.count_documents(Query::new(), "missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_distinct_values_in_first_seen_order() {
        let store = seeded().await;

        let rooms = store
            .distinct_values(Query::new(), "bookings", "room")
            .await
            .unwrap();
        assert_eq!(rooms, vec![Bson::Int32(120), Bson::Int32(101), Bson::Int32(250)]);

        let statuses = store
            .distinct_values(
                Query::builder().criterion(Filter::ne("status", "CANCELLED")).build(),
                "bookings",
                "status",
            )
            .await
            .unwrap();
        assert_eq!(
            statuses,
            vec![Bson::String("CONFIRMED".into()), Bson::String("PENDING".into())]
        );
    }

    #[tokio::test]
    async fn test_distinct_values_unwinds_arrays() {
        let store = seeded().await;
        let tags = store
            .distinct_values(Query::new(), "bookings", "tags")
            .await
            .unwrap();

        assert_eq!(tags, vec![Bson::String("vip".into()), Bson::String("late".into())]);
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let store = seeded().await;
        let clone = store.clone();

        assert_eq!(clone.count_documents(Query::new(), "bookings").await.unwrap(), 4);
    }
}
