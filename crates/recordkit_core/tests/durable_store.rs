use recordkit_core::db::migrations::latest_version;
use recordkit_core::db::{open_db, open_db_in_memory, DbError};
use recordkit_core::{
    KeyValueStore, LocalDurableStore, LocalRecordRepository, RecordRepository, RecordSchema,
    SqliteKeyValueStore, StoreConfig,
};
use rusqlite::Connection;
use serde_json::json;
use std::time::Duration;

#[test]
fn open_db_in_memory_applies_migrations() {
    let conn = open_db_in_memory().unwrap();
    assert_eq!(schema_version(&conn), latest_version());

    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'key_value');",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn read_before_any_write_is_empty() {
    let store = LocalDurableStore::durable("tasks", SqliteKeyValueStore::open_in_memory().unwrap());
    assert!(store.is_durable());
    assert!(store.read().unwrap().is_empty());
}

#[test]
fn malformed_stored_value_reads_as_empty_collection() {
    let kv = SqliteKeyValueStore::open_in_memory().unwrap();
    kv.set_item("tasks", "{not json").unwrap();
    let store = LocalDurableStore::durable("tasks", kv);
    assert!(store.read().unwrap().is_empty());

    let wrong_shape = SqliteKeyValueStore::open_in_memory().unwrap();
    wrong_shape.set_item("tasks", r#"[{"title": "no id"}]"#).unwrap();
    let store = LocalDurableStore::durable("tasks", wrong_shape);
    assert!(store.read().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn collection_survives_reopening_the_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        storage_key: "sessions".to_string(),
        simulated_delay_ms: 0,
        db_path: Some(dir.path().join("recordkit.db")),
    };

    let created = {
        let store = LocalDurableStore::open(&config);
        assert!(store.is_durable());
        let repo = LocalRecordRepository::from_config(&store, RecordSchema::sessions(), &config);
        repo.create(&json!({"title": "Physics", "duration": 30}))
            .await
            .unwrap()
    };

    let store = LocalDurableStore::open(&config);
    let repo = LocalRecordRepository::from_config(&store, RecordSchema::sessions(), &config);
    let records = repo.list().await.unwrap();
    assert_eq!(records, vec![created]);
}

#[tokio::test(start_paused = true)]
async fn keys_partition_collections_in_one_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let tasks = LocalDurableStore::durable("tasks", SqliteKeyValueStore::open(&path).unwrap());
    let dishes = LocalDurableStore::durable("dishes", SqliteKeyValueStore::open(&path).unwrap());

    LocalRecordRepository::new(&tasks, RecordSchema::tasks())
        .with_delay(Duration::ZERO)
        .create(&json!({"title": "t"}))
        .await
        .unwrap();

    assert_eq!(tasks.read().unwrap().len(), 1);
    assert!(dishes.read().unwrap().is_empty());
}

#[test]
fn unusable_db_path_falls_back_to_memory() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        db_path: Some(dir.path().join("missing-dir").join("nested").join("x.db")),
        ..StoreConfig::default()
    };

    let store = LocalDurableStore::open(&config);
    assert!(!store.is_durable());
    assert_eq!(store.key(), "records");
    assert!(store.read().unwrap().is_empty());
}

#[test]
fn clear_removes_the_stored_collection() {
    let store = LocalDurableStore::durable("tasks", SqliteKeyValueStore::open_in_memory().unwrap());
    let record = RecordSchema::tasks()
        .build_record(&json!({"title": "x"}))
        .unwrap();
    store.write(&[record]).unwrap();
    assert_eq!(store.read().unwrap().len(), 1);

    store.clear().unwrap();
    assert!(store.read().unwrap().is_empty());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}
