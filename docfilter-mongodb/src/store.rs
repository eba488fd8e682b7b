use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Document, Bson, Uuid, doc};
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, FindOptions},
};
use tracing::debug;
use docfilter_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Query, QueryVisitor, SortDirection},
};

use crate::query::MongoQueryTranslator;

/// Field MongoDB stores the document id under.
const ID_FIELD: &str = "_id";

#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }

    fn prepare_document(&self, id: &Uuid, document: &Bson) -> DocumentStoreResult<Document> {
        let mut prepared = document
            .as_document()
            .cloned()
            .ok_or_else(|| DocumentStoreError::InvalidDocument("Expected document".into()))?;

        prepared.insert(ID_FIELD, Bson::from(*id));
        Ok(prepared)
    }

    fn restore_document(&self, mut document: Document) -> Bson {
        document.remove(ID_FIELD);
        Bson::Document(document)
    }

    fn filter(&self, query: &Query) -> DocumentStoreResult<Document> {
        MongoQueryTranslator.visit_query(query)
    }
}

fn find_options(query: &Query) -> DocumentStoreResult<FindOptions> {
    let mut options = FindOptions::default();

    if let Some(limit) = query.limit {
        options.limit = Some(i64::try_from(limit).map_err(|_| {
            DocumentStoreError::InvalidPagination(format!("limit {limit} is out of range"))
        })?);
    }
    if let Some(skip) = query.offset {
        options.skip = Some(u64::try_from(skip).map_err(|_| {
            DocumentStoreError::InvalidPagination(format!("offset {skip} is out of range"))
        })?);
    }
    if let Some(sort) = &query.sort {
        options.sort = Some(doc! {
            sort.field.clone(): match sort.direction {
                SortDirection::Asc => 1,
                SortDirection::Desc => -1,
            }
        })
    }

    Ok(options)
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_documents(&self, documents: Vec<(Uuid, Bson)>, collection: &str) -> DocumentStoreResult<()> {
        let prepared = documents
            .iter()
            .map(|(id, doc)| self.prepare_document(id, doc))
            .collect::<DocumentStoreResult<Vec<Document>>>()?;

        if prepared.is_empty() {
            return Ok(());
        }

        self.get_collection(collection)
            .insert_many(prepared)
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        let filter = self.filter(&query)?;
        let options = find_options(&query)?;

        debug!(target: "docfilter::mongodb", collection, filter = %filter, "Running find");

        Ok(
            self.get_collection(collection)
                .find(filter)
                .with_options(options)
                .await
                .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
                .into_iter()
                .map(|doc| self.restore_document(doc))
                .collect()
        )
    }

    async fn count_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<u64> {
        let filter = self.filter(&query)?;

        debug!(target: "docfilter::mongodb", collection, filter = %filter, "Running count");

        self.get_collection(collection)
            .count_documents(filter)
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))
    }

    async fn distinct_values(&self, query: Query, collection: &str, field: &str) -> DocumentStoreResult<Vec<Bson>> {
        let filter = self.filter(&query)?;

        debug!(target: "docfilter::mongodb", collection, field, filter = %filter, "Running distinct");

        self.get_collection(collection)
            .distinct(field, filter)
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

/// Connection settings for a [`MongoDbStore`].
pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(MongoDbStore::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            )
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfilter_core::{page::PaginationParams, query::QueryBuilder};

    async fn store() -> MongoDbStore {
        // Client construction does not connect.
        MongoDbStore::builder("mongodb://localhost:27017", "docfilter_test")
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_prepare_document_stores_id() {
        let store = store().await;
        let id = Uuid::new();
        let prepared = store
            .prepare_document(&id, &Bson::Document(doc! { "name": "Alice" }))
            .unwrap();

        assert_eq!(prepared.get(ID_FIELD), Some(&Bson::from(id)));
        assert_eq!(
            store.restore_document(prepared),
            Bson::Document(doc! { "name": "Alice" })
        );
    }

    #[test]
    fn test_find_options_from_query() {
        let query = QueryBuilder::new()
            .paginate(&PaginationParams::new(2, 25))
            .sort("room", SortDirection::Desc)
            .build();
        let options = find_options(&query).unwrap();

        assert_eq!(options.limit, Some(25));
        assert_eq!(options.skip, Some(50));
        assert_eq!(options.sort, Some(doc! { "room": -1 }));
    }

    #[test]
    fn test_find_options_rejects_limit_out_of_range() {
        let query = QueryBuilder::new().limit(usize::MAX).build();

        assert!(matches!(
            find_options(&query),
            Err(DocumentStoreError::InvalidPagination(_))
        ));
    }

    #[tokio::test]
    async fn test_prepare_document_rejects_non_documents() {
        let store = store().await;
        assert!(matches!(
            store.prepare_document(&Uuid::new(), &Bson::Int32(1)),
            Err(DocumentStoreError::InvalidDocument(_))
        ));
    }
}
