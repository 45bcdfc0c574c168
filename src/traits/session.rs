use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::command::output::FastoObject;
use crate::config::ConnectionType;
use crate::error::NosqlResult;
use crate::traits::client::ConnectionClient;
use crate::types::{Cursor, DataBaseInfo, KeyString, NDbKValue, NKey, NKeys, ScanPage, Ttl};

/// Backend-erased view of a connection, as handed out by
/// [`ConnectionSettings::open`](crate::config::ConnectionSettings::open).
pub trait Session: Send {
    fn connection_type(&self) -> ConnectionType;

    fn is_connected(&self) -> bool;

    fn is_authenticated(&self) -> bool;

    fn current_db_name(&self) -> Option<String>;

    fn disconnect(&mut self) -> NosqlResult<()>;

    fn get(&mut self, key: &NKey) -> NosqlResult<NDbKValue>;

    fn set(&mut self, key: &NDbKValue) -> NosqlResult<NDbKValue>;

    fn delete(&mut self, keys: &[NKey]) -> NosqlResult<NKeys>;

    fn rename(&mut self, key: &NKey, new_key: &KeyString) -> NosqlResult<()>;

    fn scan(&mut self, cursor: Cursor, pattern: &str, count: u64) -> NosqlResult<ScanPage>;

    fn keys(&mut self, start: &KeyString, end: &KeyString, limit: u64) -> NosqlResult<Vec<KeyString>>;

    fn db_kcount(&mut self) -> NosqlResult<usize>;

    fn flush_db(&mut self) -> NosqlResult<()>;

    fn select(&mut self, name: &str) -> NosqlResult<DataBaseInfo>;

    fn create_database(&mut self, name: &str) -> NosqlResult<DataBaseInfo>;

    fn remove_database(&mut self, name: &str) -> NosqlResult<DataBaseInfo>;

    fn set_ttl(&mut self, key: &NKey, ttl: Ttl) -> NosqlResult<()>;

    fn get_ttl(&mut self, key: &NKey) -> NosqlResult<Ttl>;

    fn quit(&mut self) -> NosqlResult<()>;

    fn help(&self, argv: &[Vec<u8>]) -> NosqlResult<String>;

    fn execute(&mut self, input: &[u8]) -> NosqlResult<FastoObject>;

    fn interrupt_handle(&self) -> Arc<AtomicBool>;

    fn set_client(&mut self, client: Option<Box<dyn ConnectionClient>>);
}
