//! Redis backend against a live server.
//!
//! Ignored by default. Run with a disposable server:
//!
//! ```text
//! REDIS_HOST=127.0.0.1 REDIS_PORT=6379 cargo test --test redis_store -- --ignored
//! ```
//!
//! The tests use database 15 and flush it.

#![cfg(feature = "redis")]

mod common;

use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{RecordingClient, basic_contract, record, session_contract};
use nosql_core::prelude::*;

const TEST_DB: i64 = 15;

fn config() -> RedisConfig {
    let host = std::env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("REDIS_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(6379);
    RedisConfig::builder().host(host).port(port).db_num(TEST_DB).build()
}

fn open(client: Option<Box<dyn ConnectionClient>>) -> CdbConnection<RedisStore> {
    common::init_logging();
    let mut conn = CdbConnection::<RedisStore>::new(client);
    conn.connect(config()).unwrap();
    conn.flush_db().unwrap();
    conn
}

#[test]
fn unresolvable_hosts_fail_before_connecting() {
    let mut conn = CdbConnection::<RedisStore>::new(None);
    let err = conn
        .connect(RedisConfig::builder().host("").build())
        .unwrap_err();
    assert_matches!(err, NosqlError::InvalidArgument(_));

    let err = conn
        .connect(RedisConfig::builder().host("host.invalid").build())
        .unwrap_err();
    assert_matches!(err, NosqlError::ConnectionFailed(msg) if msg.starts_with("Fail connect to server"));
    assert!(!conn.is_connected());
}

#[test]
#[ignore = "needs a Redis server"]
fn redis_basic_contract() {
    basic_contract(&mut open(None));
}

#[test]
#[ignore = "needs a Redis server"]
fn redis_session_contract() {
    let client = RecordingClient::new();
    session_contract(&mut open(client.boxed()), &client);
}

#[test]
#[ignore = "needs a Redis server"]
fn connects_to_the_configured_database() {
    let conn = open(None);
    assert_eq!(conn.current_db_name().as_deref(), Some("15"));
}

#[test]
#[ignore = "needs a Redis server"]
fn typed_values_round_trip() {
    let mut conn = open(None);
    let values = [
        Value::Array(vec![Value::from("a"), Value::from("b"), Value::from("a")]),
        Value::Set(vec![b"only".to_vec()]),
        Value::ZSet(vec![(b"low".to_vec(), 1.0), (b"high".to_vec(), 2.5)]),
        Value::Hash(vec![(b"field".to_vec(), b"value".to_vec())]),
    ];
    for (i, value) in values.into_iter().enumerate() {
        let key = NKey::new(format!("typed:{i}"));
        conn.set(&NDbKValue::new(key.clone(), value.clone())).unwrap();
        // Writing again must replace, not append.
        conn.set(&NDbKValue::new(key.clone(), value.clone())).unwrap();
        assert_eq!(*conn.get(&key).unwrap().value().as_ref(), value);
    }
}

#[test]
#[ignore = "needs a Redis server"]
fn ttl_and_persist() {
    let mut conn = open(None);
    conn.set(&record("k", "v")).unwrap();
    assert_eq!(conn.get_ttl(&NKey::new("k")).unwrap(), NO_TTL);
    conn.set_ttl(&NKey::new("k"), 100).unwrap();
    assert!(conn.get_ttl(&NKey::new("k")).unwrap() > 0);
    conn.set_ttl(&NKey::new("k"), NO_TTL).unwrap();
    assert_eq!(conn.get_ttl(&NKey::new("k")).unwrap(), NO_TTL);
    assert!(conn.set_ttl(&NKey::new("missing"), 10).unwrap_err().is_not_found());
}

#[test]
#[ignore = "needs a Redis server"]
fn select_switches_numbered_databases() {
    let mut conn = open(None);
    conn.set(&record("here", "1")).unwrap();
    assert_matches!(conn.select("nope"), Err(NosqlError::InvalidArgument(_)));
    let info = conn.select("14").unwrap();
    assert_eq!(info.name(), "14");
    assert_eq!(conn.current_db_name().as_deref(), Some("14"));
    conn.select("15").unwrap();
    assert_eq!(conn.get(&NKey::new("here")).unwrap().value_string(), "1");
    assert_matches!(
        conn.keys(&KeyString::from("a"), &KeyString::from("z"), 10),
        Err(NosqlError::NotSupported(_))
    );
}

#[test]
#[ignore = "needs a Redis server"]
fn subscribe_until_interrupted() {
    let mut listener = open(None);
    let stop = listener.interrupt_handle();

    let publisher = thread::spawn(move || {
        let mut conn = CdbConnection::<RedisStore>::new(None);
        conn.connect(config()).unwrap();
        thread::sleep(Duration::from_millis(300));
        conn.backend_mut().publish("news", b"hello").unwrap();
        thread::sleep(Duration::from_millis(300));
        stop.store(true, Ordering::SeqCst);
    });

    let mut received = Vec::new();
    let result = listener
        .backend_mut()
        .subscribe(&["news"], |message| received.push(message));
    publisher.join().unwrap();

    assert_matches!(result, Err(NosqlError::Interrupted));
    assert!(!listener.is_interrupted());
    assert_eq!(
        received,
        vec![Value::Array(vec![Value::from("message"), Value::from("news"), Value::from("hello")])]
    );
    // The connection is usable again after the listen loop.
    listener.set(&record("after", "ok")).unwrap();
}

#[test]
#[ignore = "needs a Redis server"]
fn monitor_reopens_the_connection() {
    let mut conn = open(None);
    conn.set_interrupted(true);
    let out = conn.execute(b"MONITOR").unwrap();
    assert!(out.children().is_empty());
    assert_eq!(conn.current_db_name().as_deref(), Some("15"));
    assert_eq!(conn.execute(b"DBSIZE").unwrap().to_string(), "0");
}

#[test]
#[ignore = "needs a Redis server"]
fn monitor_keeps_the_selected_database() {
    let mut conn = open(None);
    conn.execute(b"SELECT 14\nFLUSHDB\nSET marker here").unwrap();
    assert_eq!(conn.current_db_name().as_deref(), Some("14"));

    conn.set_interrupted(true);
    conn.execute(b"MONITOR").unwrap();

    assert_eq!(conn.current_db_name().as_deref(), Some("14"));
    assert_eq!(conn.get(&NKey::new("marker")).unwrap().value_string(), "here");
    conn.flush_db().unwrap();
}
