//! Redb backend: shared contract and single-database behaviour.

#![cfg(feature = "redb")]

mod common;

use assert_matches::assert_matches;
use common::{RecordingClient, basic_contract, keys_contract, record, session_contract};
use nosql_core::prelude::*;
use tempfile::TempDir;

fn config(dir: &TempDir) -> RedbConfig {
    RedbConfig::builder().db_path(dir.path().join("store.redb")).build()
}

fn open(dir: &TempDir, client: Option<Box<dyn ConnectionClient>>) -> CdbConnection<RedbStore> {
    common::init_logging();
    let mut conn = CdbConnection::<RedbStore>::new(client);
    conn.connect(config(dir)).unwrap();
    conn
}

#[test]
fn redb_basic_contract() {
    let dir = TempDir::new().unwrap();
    basic_contract(&mut open(&dir, None));
}

#[test]
fn redb_keys_contract() {
    let dir = TempDir::new().unwrap();
    keys_contract(&mut open(&dir, None));
}

#[test]
fn redb_session_contract() {
    let dir = TempDir::new().unwrap();
    let client = RecordingClient::new();
    session_contract(&mut open(&dir, client.boxed()), &client);
}

/// The walkthrough from the crate docs, against a file-backed engine.
#[test]
fn single_database_walkthrough() {
    let dir = TempDir::new().unwrap();
    let mut conn = open(&dir, None);

    conn.set(&record("a", "1")).unwrap();
    conn.set(&record("b", "2")).unwrap();
    conn.set(&record("c", "3")).unwrap();

    let first = conn.scan(0, "*", 2).unwrap();
    assert_eq!(first.keys, vec![KeyString::from("a"), KeyString::from("b")]);
    assert_eq!(first.cursor, 2);
    let second = conn.scan(first.cursor, "*", 2).unwrap();
    assert_eq!(second.keys, vec![KeyString::from("c")]);
    assert!(second.is_last());

    assert_eq!(
        conn.keys(&KeyString::from("a"), &KeyString::from("c"), 10).unwrap(),
        vec![KeyString::from("b")]
    );

    conn.rename(&NKey::new("a"), &KeyString::from("z")).unwrap();
    assert_eq!(conn.get(&NKey::new("z")).unwrap().value_string(), "1");
    assert_eq!(conn.db_kcount().unwrap(), 3);

    assert_eq!(conn.select("default").unwrap().keys_count(), 3);
    assert_matches!(conn.select("1"), Err(NosqlError::InvalidArgument(_)));
    assert_matches!(conn.create_database("x"), Err(NosqlError::NotSupported(_)));
}

#[test]
fn reopens_an_existing_file() {
    let dir = TempDir::new().unwrap();
    {
        let mut conn = open(&dir, None);
        conn.set(&record("kept", "value")).unwrap();
    }
    let mut conn = open(&dir, None);
    assert_eq!(conn.get(&NKey::new("kept")).unwrap().value_string(), "value");
}

#[test]
fn path_preconditions() {
    let dir = TempDir::new().unwrap();

    let mut conn = CdbConnection::<RedbStore>::new(None);
    let missing_parent = RedbConfig::builder()
        .db_path(dir.path().join("no/such/dir/store.redb"))
        .build();
    assert_matches!(conn.connect(missing_parent), Err(NosqlError::InvalidArgument(msg)) if msg.starts_with("Invalid input path("));

    let no_create = RedbConfig::builder()
        .db_path(dir.path().join("absent.redb"))
        .create_if_missing(false)
        .build();
    assert_matches!(conn.connect(no_create), Err(NosqlError::InvalidArgument(_)));
    assert!(!conn.is_connected());
}

#[test]
fn info_describes_the_engine() {
    let dir = TempDir::new().unwrap();
    let mut conn = open(&dir, None);
    conn.set(&record("k", "v")).unwrap();
    let Value::Hash(fields) = conn.info(None).unwrap() else {
        panic!("info should be a hash");
    };
    assert!(fields.contains(&(b"backend".to_vec(), b"redb".to_vec())));
    assert!(fields.contains(&(b"keys".to_vec(), b"1".to_vec())));
}

#[test]
fn oversized_cache_setting_still_opens() {
    let dir = TempDir::new().unwrap();
    let mut conn = CdbConnection::<RedbStore>::new(None);
    conn.connect(
        RedbConfig::builder()
            .db_path(dir.path().join("big-cache.redb"))
            .cache_size_mb(usize::MAX)
            .build(),
    )
    .unwrap();
    conn.set(&record("k", "v")).unwrap();
    assert_eq!(conn.get(&NKey::new("k")).unwrap().value_string(), "v");
}
