//! Schema evolution tests.
//!
//! Columns appear as new fields are inserted, are typed from the first
//! value seen, and are never dropped or retyped.

use docstore_client::{
    ClientError, Connection, ConnectionConfig, Field, Record, SchemaConflict, StorageType, Value,
    ValueKind,
};
use docstore_engine::SqliteEngine;
use docstore_test::{
    decimal, memory_connection, recorded_connection, sample_record, RecordingEngine, TempDatabase,
};

#[test]
fn test_new_table_has_no_columns() {
    let mut conn = memory_connection();
    let test = conn.table("test").unwrap();
    assert!(test.columns().unwrap().is_empty());
    assert!(test.all().unwrap().is_empty());
}

#[test]
fn test_columns_typed_from_first_values() {
    let mut conn = memory_connection();
    let test = conn.table("test").unwrap();
    test.insert(&sample_record()).unwrap();
    test.insert(
        &Record::new()
            .with("list", vec![1, 2])
            .with("map", Value::Map([("k".to_string(), Value::from("v"))].into())),
    )
    .unwrap();

    let columns = test.columns().unwrap();
    assert_eq!(columns.get("integer"), Some(&StorageType::Integer));
    assert_eq!(columns.get("floating_point"), Some(&StorageType::Decimal));
    assert_eq!(columns.get("string"), Some(&StorageType::Text));
    assert_eq!(columns.get("list"), Some(&StorageType::Json));
    assert_eq!(columns.get("map"), Some(&StorageType::Json));
    assert_eq!(conn.stats().columns_added, 5);
}

#[test]
fn test_schema_only_grows() {
    let mut conn = memory_connection();
    let test = conn.table("test").unwrap();
    let records = [
        Record::new().with("a", 1),
        Record::new().with("b", "x"),
        Record::new().with("a", 2).with("c", decimal("0.5")),
        Record::new(),
        Record::new().with("b", "y"),
    ];

    let mut before = test.columns().unwrap();
    for record in &records {
        test.insert(record).unwrap();
        let after = test.columns().unwrap();
        assert!(before.is_subset_of(&after), "{before} not within {after}");
        for field in record.keys() {
            assert!(after.contains(field));
        }
        before = after;
    }
    assert_eq!(before.len(), 3);
    assert_eq!(test.all().unwrap().len(), records.len());
}

#[test]
fn test_known_fields_add_no_columns() {
    let (mut conn, log) = recorded_connection();
    let test = conn.table("test").unwrap();
    test.insert(&sample_record()).unwrap();
    assert_eq!(log.count("add_column"), 3);

    log.clear();
    test.insert(&sample_record()).unwrap();
    assert_eq!(log.count("add_column"), 0);
    assert_eq!(log.count("columns"), 0);
}

#[test]
fn test_unmapped_value_rejects_whole_record() {
    let mut conn = memory_connection();
    let test = conn.table("test").unwrap();

    for value in [Value::Boolean(true), Value::Null] {
        let record = Record::new().with("fresh", 1).with("flag", value.clone());
        let err = test.insert(&record).unwrap_err();
        match err {
            ClientError::SchemaConflict(SchemaConflict::UnmappedValue { field, kind }) => {
                assert_eq!(field, "flag");
                assert_eq!(kind, value.kind());
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    assert!(test.columns().unwrap().is_empty());
    assert!(test.all().unwrap().is_empty());
    assert_eq!(conn.stats().rollbacks, 2);
}

#[test]
fn test_null_in_existing_column_is_stored() {
    let mut conn = memory_connection();
    let test = conn.table("test").unwrap();
    test.insert(&Record::new().with("string", "stuff")).unwrap();
    test.insert(&Record::new().with("string", Value::Null)).unwrap();

    let rows = test.query(Field::new("string").exists()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(test.all().unwrap().len(), 2);
    assert_eq!(Value::Null.kind(), ValueKind::Null);
}

#[test]
fn test_uncached_connection_reads_catalog_each_time() {
    let inner = SqliteEngine::open_in_memory().unwrap();
    let (engine, log) = RecordingEngine::new(Box::new(inner));
    let config = ConnectionConfig::sqlite_memory().cache_columns(false);
    let mut conn = Connection::with_engine(Box::new(engine), config);

    let test = conn.table("test").unwrap();
    test.insert(&sample_record()).unwrap();
    log.clear();

    test.insert(&sample_record()).unwrap();
    test.insert(&sample_record()).unwrap();
    assert_eq!(log.count("columns"), 2);
    assert_eq!(log.count("add_column"), 0);
    assert_eq!(test.all().unwrap().len(), 3);
}

#[test]
fn test_second_connection_reuses_existing_table() {
    let db = TempDatabase::new();

    let mut first = db.connect();
    let test = first.table("test").unwrap();
    test.insert(&sample_record()).unwrap();
    first.close().unwrap();

    let (mut second, log) = db.connect_recorded();
    let test = second.table("test").unwrap();
    assert_eq!(log.count("create_table"), 0);
    assert_eq!(second.stats().tables_created, 0);

    let rows = test.all().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("floating_point"), Some(&decimal("1.3")));
    assert!(db.path().exists());
}

#[test]
fn test_concurrent_writers_agree_on_columns() {
    let db = TempDatabase::new();
    let mut a = db.connect();
    let mut b = db.connect();
    let from_a = a.table("shared").unwrap();
    let from_b = b.table("shared").unwrap();

    // Both connections cache an empty column map before either writes.
    from_a.insert(&Record::new().with("n", 1)).unwrap();
    from_b.insert(&Record::new().with("n", 2)).unwrap();

    assert_eq!(from_a.columns().unwrap().get("n"), Some(&StorageType::Integer));
    assert_eq!(from_b.all().unwrap().len(), 2);
}

#[test]
fn test_concurrent_incompatible_column_is_conflict() {
    let db = TempDatabase::new();
    let mut a = db.connect();
    let mut b = db.connect();
    let from_a = a.table("shared").unwrap();
    let from_b = b.table("shared").unwrap();

    from_a.insert(&Record::new().with("n", "text first")).unwrap();
    let err = from_b.insert(&Record::new().with("n", 2)).unwrap_err();
    assert!(matches!(
        err,
        ClientError::SchemaConflict(SchemaConflict::IncompatibleColumn {
            expected: StorageType::Integer,
            found: StorageType::Text,
            ..
        })
    ));

    // The conflict refreshed the cache: integers are now refused outright
    // and text writes through.
    let err = from_b.insert(&Record::new().with("n", 3)).unwrap_err();
    assert!(matches!(err, ClientError::TypeMismatch(_)), "{err:?}");
    from_b.insert(&Record::new().with("n", "text second")).unwrap();
    assert_eq!(from_a.all().unwrap().len(), 2);
}

#[test]
fn test_incompatible_value_is_type_mismatch() {
    let mut conn = memory_connection();
    let test = conn.table("test").unwrap();
    test.insert(&Record::new().with("n", 1)).unwrap();

    let err = test.insert(&Record::new().with("n", "abc")).unwrap_err();
    assert!(matches!(err, ClientError::TypeMismatch(_)), "{err:?}");

    // Nothing from a rejected record is kept.
    let err = test
        .insert(&Record::new().with("extra", "x").with("n", decimal("2.5")))
        .unwrap_err();
    assert!(matches!(err, ClientError::TypeMismatch(_)), "{err:?}");

    assert_eq!(test.all().unwrap(), vec![Record::new().with("n", 1)]);
    assert!(!test.columns().unwrap().contains("extra"));
    assert_eq!(conn.stats().rollbacks, 2);
}

#[test]
fn test_structured_value_in_text_column_is_type_mismatch() {
    let mut conn = memory_connection();
    let test = conn.table("test").unwrap();
    test.insert(&Record::new().with("s", "stuff")).unwrap();

    let err = test
        .insert(&Record::new().with("s", vec!["one", "two"]))
        .unwrap_err();
    assert!(matches!(err, ClientError::TypeMismatch(_)), "{err:?}");

    let rows = test.all().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("s"), Some(&Value::from("stuff")));
    assert_eq!(test.columns().unwrap().get("s"), Some(&StorageType::Text));
}
