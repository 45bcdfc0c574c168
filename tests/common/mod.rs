// Common test utilities and helpers

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use nosql_core::prelude::*;

/// Turns on `RUST_LOG`-driven logging once per test binary.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One notification as seen by [`RecordingClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CreatedDb(String),
    RemovedDb(String),
    ChangedDb(String, usize),
    Flushed,
    RemovedKeys(Vec<KeyString>),
    AddedKey(KeyString, Ttl),
    LoadedKey(KeyString),
    RenamedKey(KeyString, KeyString),
    ChangedTtl(KeyString, Ttl),
    LoadedTtl(KeyString, Ttl),
    Quited,
}

/// Client that appends every notification to a shared log.
#[derive(Clone, Default)]
pub struct RecordingClient {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Option<Box<dyn ConnectionClient>> {
        Some(Box::new(self.clone()))
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl ConnectionClient for RecordingClient {
    fn on_created_db(&mut self, db: &DataBaseInfo) {
        self.push(Event::CreatedDb(db.name().to_string()));
    }

    fn on_removed_db(&mut self, db: &DataBaseInfo) {
        self.push(Event::RemovedDb(db.name().to_string()));
    }

    fn on_changed_current_db(&mut self, db: &DataBaseInfo) {
        self.push(Event::ChangedDb(db.name().to_string(), db.keys_count()));
    }

    fn on_flushed_current_db(&mut self) {
        self.push(Event::Flushed);
    }

    fn on_removed_keys(&mut self, keys: &NKeys) {
        self.push(Event::RemovedKeys(keys.iter().map(|k| k.key().clone()).collect()));
    }

    fn on_added_key(&mut self, key: &NDbKValue) {
        self.push(Event::AddedKey(key.key().key().clone(), key.key().ttl()));
    }

    fn on_loaded_key(&mut self, key: &NDbKValue) {
        self.push(Event::LoadedKey(key.key().key().clone()));
    }

    fn on_renamed_key(&mut self, key: &NKey, new_key: &KeyString) {
        self.push(Event::RenamedKey(key.key().clone(), new_key.clone()));
    }

    fn on_changed_key_ttl(&mut self, key: &NKey, ttl: Ttl) {
        self.push(Event::ChangedTtl(key.key().clone(), ttl));
    }

    fn on_loaded_key_ttl(&mut self, key: &NKey, ttl: Ttl) {
        self.push(Event::LoadedTtl(key.key().clone(), ttl));
    }

    fn on_quited(&mut self) {
        self.push(Event::Quited);
    }
}

pub fn record(key: &str, value: &str) -> NDbKValue {
    NDbKValue::new(NKey::new(key), Value::from(value))
}

/// Pages through the whole keyspace with `count`-sized pages.
pub fn scan_all(session: &mut dyn Session, pattern: &str, count: u64) -> Vec<KeyString> {
    let mut cursor = 0;
    let mut keys = Vec::new();
    let mut pages = 0;
    loop {
        let page = session.scan(cursor, pattern, count).unwrap();
        keys.extend(page.keys);
        pages += 1;
        assert!(pages < 10_000, "scan did not terminate");
        if page.cursor == 0 {
            return keys;
        }
        cursor = page.cursor;
    }
}

/// Behaviour every backend shares. `session` must be connected to an
/// empty database.
pub fn basic_contract(session: &mut dyn Session) {
    // Set then Get returns the value.
    session.set(&record("alpha", "1")).unwrap();
    assert_eq!(session.get(&NKey::new("alpha")).unwrap().value_string(), "1");

    // Overwrite.
    session.set(&record("alpha", "2")).unwrap();
    assert_eq!(session.get(&NKey::new("alpha")).unwrap().value_string(), "2");

    // Missing keys.
    assert!(session.get(&NKey::new("missing")).unwrap_err().is_not_found());

    // Delete reports only what it removed.
    let deleted = session
        .delete(&[NKey::new("alpha"), NKey::new("missing")])
        .unwrap();
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].key(), &KeyString::from("alpha"));
    assert!(session.get(&NKey::new("alpha")).unwrap_err().is_not_found());

    // Rename moves the value.
    session.set(&record("old", "v")).unwrap();
    session.rename(&NKey::new("old"), &KeyString::from("new")).unwrap();
    assert!(session.get(&NKey::new("old")).unwrap_err().is_not_found());
    assert_eq!(session.get(&NKey::new("new")).unwrap().value_string(), "v");

    // Empty keys never reach the engine.
    assert_eq!(
        session.get(&NKey::new("")).unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );

    // Count, scan and flush.
    for i in 0..25 {
        session.set(&record(&format!("key:{i:02}"), "x")).unwrap();
    }
    assert_eq!(session.db_kcount().unwrap(), 26);

    let mut all = scan_all(session, "key:*", 7);
    all.sort();
    all.dedup();
    assert_eq!(all.len(), 25);
    assert!(all.iter().all(|k| k.as_bytes().starts_with(b"key:")));

    session.flush_db().unwrap();
    assert_eq!(session.db_kcount().unwrap(), 0);
    assert!(scan_all(session, "*", 10).is_empty());
}

/// Ordered range queries for engines with a `KEYS` command.
pub fn keys_contract(session: &mut dyn Session) {
    for key in ["a", "b", "c", "d", "e"] {
        session.set(&record(key, key)).unwrap();
    }
    let keys = session
        .keys(&KeyString::from("a"), &KeyString::from("e"), 10)
        .unwrap();
    assert_eq!(keys, vec![KeyString::from("b"), KeyString::from("c"), KeyString::from("d")]);

    let limited = session
        .keys(&KeyString::from("a"), &KeyString::from("z"), 2)
        .unwrap();
    assert_eq!(limited, vec![KeyString::from("b"), KeyString::from("c")]);
}

/// Guards, notifications and the command line.
pub fn session_contract(session: &mut dyn Session, client: &RecordingClient) {
    assert!(session.is_connected());
    assert!(session.is_authenticated());
    client.take();

    session.set(&record("k", "v")).unwrap();
    session.get(&NKey::new("k")).unwrap();
    let _ = session.get(&NKey::new("nope"));
    session.delete(&[NKey::new("k"), NKey::new("nope")]).unwrap();
    assert_eq!(
        client.take(),
        vec![
            Event::AddedKey("k".into(), NO_TTL),
            Event::LoadedKey("k".into()),
            Event::RemovedKeys(vec!["k".into()]),
        ]
    );

    let out = session.execute(b"SET greeting \"hello world\"\nGET greeting\nDBKCOUNT").unwrap();
    let values: Vec<String> = out
        .children()
        .iter()
        .filter_map(|child| child.value().map(|v| v.to_string()))
        .collect();
    assert_eq!(values, vec!["OK", "hello world", "1"]);

    let err = session.execute(b"NOSUCH thing").unwrap_err();
    assert_eq!(err.to_string(), "Unknown sequence: 'NOSUCH thing'.");
    let err = session.execute(b"GET").unwrap_err();
    assert_eq!(err.to_string(), "Invalid input argument(s) for command: GET.");

    let help = session.help(&[b"get".to_vec()]).unwrap();
    assert!(help.starts_with("name: GET\nsummary: "), "{help}");
    assert!(help.ends_with("\r\n"));
    let usage = session.help(&[]).unwrap();
    assert!(usage.contains("based on"), "{usage}");

    client.take();
    session.quit().unwrap();
    assert!(!session.is_connected());
    assert_eq!(client.take(), vec![Event::Quited]);
    assert_eq!(session.get(&NKey::new("k")).unwrap_err().kind(), ErrorKind::NotConnected);
    // A second disconnect is a no-op.
    session.disconnect().unwrap();
}
