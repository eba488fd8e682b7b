use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docfilter::{bson::Bson, memory::InMemoryStore, prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Filterable)]
struct Address {
    city: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Filterable)]
struct Guest {
    email: String,
    address: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Filterable)]
#[serde(rename_all = "camelCase")]
struct Booking {
    id: Uuid,
    name: String,
    room: i32,
    status: String,
    check_in: DateTime,
    guest: Guest,
    #[filter(skip)]
    notes: Option<String>,
}

impl Document for Booking {
    fn id(&self) -> &Uuid {
        &self.id
    }

    fn collection_name() -> &'static str {
        "bookings"
    }
}

fn booking(name: &str, room: i32, status: &str, check_in: &str, email: &str, city: &str) -> Booking {
    Booking {
        id: Uuid::new(),
        name: name.to_string(),
        room,
        status: status.to_string(),
        check_in: DateTime::parse_rfc3339_str(check_in).unwrap(),
        guest: Guest {
            email: email.to_string(),
            address: Address { city: city.to_string() },
        },
        notes: None,
    }
}

fn bookings() -> Vec<Booking> {
    vec![
        booking("Alice", 120, "CONFIRMED", "2024-06-01T14:00:00Z", "alice+vip@example.com", "Lisbon"),
        booking("Bob", 101, "PENDING", "2024-06-03T14:00:00Z", "bob@example.com", "Porto"),
        booking("Alice", 250, "CONFIRMED", "2024-07-10T14:00:00Z", "alice@example.com", "Lisbon"),
        booking("Carol", 199, "CANCELLED", "2024-05-20T14:00:00Z", "carol@example.org", "Madrid"),
        booking("Alice", 150, "PENDING", "2024-08-01T14:00:00Z", "alice@example.com", "Lisbon"),
    ]
}

async fn seeded_store() -> DocumentStore<InMemoryStore> {
    let store = DocumentStore::new(InMemoryStore::builder().build().await.unwrap());
    store
        .typed_collection::<Booking>()
        .insert(bookings())
        .await
        .unwrap();
    store
}

fn rooms(page: &Page<Booking>) -> Vec<i32> {
    page.items.iter().map(|booking| booking.room).collect()
}

/// Delegates to an in-memory store and counts every backend call.
#[derive(Debug, Default)]
struct CountingBackend {
    inner: InMemoryStore,
    calls: AtomicUsize,
}

impl CountingBackend {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StoreBackend for CountingBackend {
    async fn insert_documents(&self, documents: Vec<(Uuid, Bson)>, collection: &str) -> DocumentStoreResult<()> {
        self.touch();
        StoreBackend::insert_documents(&self.inner, documents, collection).await
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        self.touch();
        StoreBackend::query_documents(&self.inner, query, collection).await
    }

    async fn count_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<u64> {
        self.touch();
        StoreBackend::count_documents(&self.inner, query, collection).await
    }

    async fn distinct_values(&self, query: Query, collection: &str, field: &str) -> DocumentStoreResult<Vec<Bson>> {
        self.touch();
        StoreBackend::distinct_values(&self.inner, query, collection, field).await
    }
}

#[tokio::test]
async fn test_range_and_equality_scenario() {
    let store = seeded_store().await;

    let page = store
        .typed_collection::<Booking>()
        .find_all_with_filter(
            &["room|gte|100", "room|lt|200", "name|eq|Alice"],
            &PaginationParams::new(0, 10),
        )
        .await
        .unwrap();

    assert_eq!(rooms(&page), vec![120, 150]);
    assert_eq!(page.current_page, 0);
    assert_eq!(page.total_items, 2);
    assert_eq!(page.total_pages, 1);
    assert!(!page.has_next);
}

#[tokio::test]
async fn test_pagination_metadata() {
    let store = DocumentStore::new(InMemoryStore::new());
    let collection = store.typed_collection::<Booking>();
    collection
        .insert(
            (0..12)
                .map(|n| booking("Guest", 100 + n, "CONFIRMED", "2024-06-01T14:00:00Z", "g@example.com", "Lisbon"))
                .collect(),
        )
        .await
        .unwrap();

    let second = collection
        .find_all_with_filter(&["room|gte|100"], &PaginationParams::new(1, 5))
        .await
        .unwrap();

    assert_eq!(rooms(&second), vec![105, 106, 107, 108, 109]);
    assert_eq!(second.current_page, 1);
    assert_eq!(second.total_items, 12);
    assert_eq!(second.total_pages, 3);
    assert!(second.has_next);

    let last = collection
        .find_all_with_filter(&["room|gte|100"], &PaginationParams::new(2, 5))
        .await
        .unwrap();

    assert_eq!(rooms(&last), vec![110, 111]);
    assert!(!last.has_next);
}

#[tokio::test]
async fn test_page_index_at_upper_bound() {
    let store = seeded_store().await;
    let page = store
        .typed_collection::<Booking>()
        .find_all_with_filter::<&str>(&[], &PaginationParams::new(usize::MAX, 1))
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total_items, 5);
    assert_eq!(page.total_pages, 5);
    assert!(!page.has_next);
}

#[tokio::test]
async fn test_empty_filter_returns_everything() {
    let store = seeded_store().await;
    let page = store
        .typed_collection::<Booking>()
        .find_all_with_filter::<&str>(&[], &PaginationParams::default())
        .await
        .unwrap();

    assert_eq!(page.total_items, 5);
}

#[tokio::test]
async fn test_membership_and_timestamp_filters() {
    let store = seeded_store().await;
    let page = store
        .typed_collection::<Booking>()
        .find_all_with_filter(
            &["status|IN|CONFIRMED;PENDING;CONFIRMED", "checkIn|gte|2024-06-02T00:00:00"],
            &PaginationParams::default(),
        )
        .await
        .unwrap();

    assert_eq!(rooms(&page), vec![101, 250, 150]);

    let excluded = store
        .typed_collection::<Booking>()
        .find_all_with_filter(&["status|nin|CONFIRMED;PENDING"], &PaginationParams::default())
        .await
        .unwrap();

    assert_eq!(rooms(&excluded), vec![199]);
}

#[tokio::test]
async fn test_nested_paths() {
    let store = seeded_store().await;
    let collection = store.typed_collection::<Booking>();

    let page = collection
        .find_all_with_filter(&["guest.address.city|eq|Lisbon", "room|lte|200"], &PaginationParams::default())
        .await
        .unwrap();
    assert_eq!(rooms(&page), vec![120, 150]);

    assert!(matches!(
        collection
            .find_all_with_filter(&["guest.phone|eq|123"], &PaginationParams::default())
            .await,
        Err(DocumentStoreError::Filter(FilterError::UnknownField { .. }))
    ));

    assert!(matches!(
        collection
            .find_all_with_filter(&["guest|eq|Alice"], &PaginationParams::default())
            .await,
        Err(DocumentStoreError::Filter(FilterError::UnsupportedFieldType { .. }))
    ));
}

#[tokio::test]
async fn test_skipped_field_is_not_filterable() {
    let store = seeded_store().await;
    let result = store
        .typed_collection::<Booking>()
        .find_all_with_filter(&["notes|eq|late"], &PaginationParams::default())
        .await;

    assert!(matches!(
        result,
        Err(DocumentStoreError::Filter(FilterError::UnknownField { .. }))
    ));
}

#[tokio::test]
async fn test_distinct_values_respect_filters() {
    let store = seeded_store().await;
    let collection = store.typed_collection::<Booking>();

    let statuses = collection
        .distinct_values(&["status|ne|CANCELLED"], "status")
        .await
        .unwrap();
    assert_eq!(
        statuses,
        vec![Bson::String("CONFIRMED".into()), Bson::String("PENDING".into())]
    );

    let cities = collection
        .distinct_values(&["name|eq|Alice"], "guest.address.city")
        .await
        .unwrap();
    assert_eq!(cities, vec![Bson::String("Lisbon".into())]);

    assert!(matches!(
        collection.distinct_values::<&str>(&[], "phone").await,
        Err(DocumentStoreError::Filter(FilterError::UnknownField { .. }))
    ));
}

#[tokio::test]
async fn test_invalid_tokens_fail_before_store_access() {
    let store = DocumentStore::new(CountingBackend::default());
    let collection = store.typed_collection::<Booking>();

    let cases: [(&str, fn(&FilterError) -> bool); 4] = [
        ("room|eq", |e| matches!(e, FilterError::Malformed(_))),
        ("room|between|1", |e| matches!(e, FilterError::UnknownOperator(_))),
        ("room|eq|abc", |e| matches!(e, FilterError::Coercion { .. })),
        ("room|regex|1", |e| matches!(e, FilterError::Coercion { .. })),
    ];

    for (token, expected) in cases {
        match collection
            .find_all_with_filter(&["name|eq|Alice", token], &PaginationParams::default())
            .await
        {
            Err(DocumentStoreError::Filter(error)) => assert!(expected(&error), "{token}: {error}"),
            other => panic!("{token}: unexpected {other:?}"),
        }
    }

    assert!(matches!(
        collection
            .find_all_with_filter(&["room|eq|1"], &PaginationParams::new(0, 0))
            .await,
        Err(DocumentStoreError::InvalidPagination(_))
    ));

    assert_eq!(store.backend().calls(), 0);
}

#[tokio::test]
async fn test_regex_modes() {
    let raw = seeded_store().await;
    let page = raw
        .typed_collection::<Booking>()
        .find_all_with_filter(&["guest.email|regex|@example\\.com$"], &PaginationParams::default())
        .await
        .unwrap();
    assert_eq!(page.total_items, 4);

    // `+vip` is not a valid pattern.
    assert!(matches!(
        raw.typed_collection::<Booking>()
            .find_all_with_filter(&["guest.email|regex|+vip"], &PaginationParams::default())
            .await,
        Err(DocumentStoreError::Backend(_))
    ));

    let literal = DocumentStore::new(InMemoryStore::new())
        .with_parser_config(ParserConfig::default().with_regex_mode(RegexMode::Literal));
    literal
        .typed_collection::<Booking>()
        .insert(bookings())
        .await
        .unwrap();

    let page = literal
        .typed_collection::<Booking>()
        .find_all_with_filter(&["guest.email|regex|+vip"], &PaginationParams::default())
        .await
        .unwrap();
    assert_eq!(rooms(&page), vec![120]);
}

#[tokio::test]
async fn test_untyped_collection_from_registry() {
    let store = seeded_store()
        .await
        .with_registry(SchemaRegistry::new().register_type::<Booking>("bookings"));

    assert!(store.collection("rooms").is_none());

    let collection = store.collection("bookings").unwrap();
    let page = collection
        .find_all_with_filter(&["room|gt|200"], &PaginationParams::default())
        .await
        .unwrap();

    assert_eq!(page.total_items, 1);
    assert_eq!(
        page.items[0].as_document().unwrap().get_i32("room").unwrap(),
        250
    );

    let json = page.to_json().unwrap();
    for key in ["currentPage", "totalItems", "totalPages", "items", "hasNext"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
}

#[tokio::test]
async fn test_dynamic_store() {
    let store = seeded_store().await.into_dyn();
    assert!(store.backend::<InMemoryStore>().is_some());

    let collection = store.typed_collection::<Booking>();
    let page = collection
        .find_all_with_filter(&["name|eq|Bob"], &PaginationParams::default())
        .await
        .unwrap();
    assert_eq!(rooms(&page), vec![101]);

    let names = collection
        .distinct_values::<&str>(&[], "name")
        .await
        .unwrap();
    assert_eq!(names.len(), 3);

    store.shutdown().await.unwrap();
}

#[test]
fn test_derived_schema() {
    let schema = Booking::schema();

    assert_eq!(schema.name(), "Booking");
    assert_eq!(schema.resolve("checkIn").unwrap(), ScalarType::Timestamp);
    assert_eq!(schema.resolve("id").unwrap(), ScalarType::Uuid);
    assert_eq!(schema.resolve("guest.address.city").unwrap(), ScalarType::String);
    assert!(schema.field("notes").is_none());
    assert!(schema.field("check_in").is_none());
}
