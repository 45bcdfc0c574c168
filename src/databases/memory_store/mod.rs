//! In-process backend with key expiry.
//!
//! Stands in for cache servers such as Memcached: a single unnamed
//! database, any value type, per-key TTL, and no native cursor. Nothing is
//! persisted; disconnecting drops the data.
//!
//! ```
//! use nosql_core::config::MemoryConfig;
//! use nosql_core::connection::CdbConnection;
//! use nosql_core::databases::MemoryStore;
//! use nosql_core::types::{NDbKValue, NKey, Value};
//!
//! let mut conn = CdbConnection::<MemoryStore>::new(None);
//! conn.connect(MemoryConfig::default()).unwrap();
//! conn.set(&NDbKValue::new(NKey::new("greeting"), Value::from("hello"))).unwrap();
//! let loaded = conn.get(&NKey::new("greeting")).unwrap();
//! assert_eq!(loaded.value_string(), "hello");
//! ```

pub mod engine;

use std::sync::{Arc, OnceLock};

use crate::config::{ConnectionType, MemoryConfig};
use crate::connection::{DbConnection, offset_scan, range_keys};
use crate::databases::EmbeddedTranslator;
use crate::error::{NosqlError, NosqlResult};
use crate::traits::{Backend, CommandTranslator, ConnectionAllocator};
use crate::types::{Cursor, EXPIRED_TTL, KeyString, NDbKValue, NKey, ScanPage, Ttl};

pub use engine::{InsertOutcome, MemoryEngine};

pub struct MemoryAllocator;

impl ConnectionAllocator for MemoryAllocator {
    type Config = MemoryConfig;
    type Handle = MemoryEngine;

    const NAME: &'static str = "MemoryStore";

    fn connect(config: &MemoryConfig) -> NosqlResult<MemoryEngine> {
        if config.max_entries == Some(0) {
            return Err(NosqlError::open_failed("max_entries must be greater than zero"));
        }
        Ok(MemoryEngine::new(config.max_entries))
    }

    fn disconnect(_engine: MemoryEngine) {}

    fn is_connected(_engine: &MemoryEngine) -> bool {
        true
    }
}

command_table!(MEMORY_COMMANDS, MemoryStore, [
    keys_command!(MemoryStore),
    expire_command!(MemoryStore),
    ttl_command!(MemoryStore),
]);

pub struct MemoryStore {
    base: DbConnection<MemoryAllocator>,
}

impl MemoryStore {
    fn engine(&mut self) -> NosqlResult<&mut MemoryEngine> {
        self.base.handle_mut()
    }
}

impl Backend for MemoryStore {
    type Allocator = MemoryAllocator;

    const CONNECTION_TYPE: ConnectionType = ConnectionType::Memory;

    fn create() -> Self {
        MemoryStore {
            base: DbConnection::new(),
        }
    }

    fn based_on() -> &'static str {
        "std::collections::BTreeMap"
    }

    fn version_api() -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn commands() -> &'static [crate::command::CommandHolder<crate::connection::CdbConnection<Self>>] {
        MEMORY_COMMANDS
    }

    fn translator(&self) -> Arc<dyn CommandTranslator> {
        static TRANSLATOR: OnceLock<Arc<EmbeddedTranslator>> = OnceLock::new();
        TRANSLATOR
            .get_or_init(|| Arc::new(EmbeddedTranslator::new(MEMORY_COMMANDS, true)))
            .clone()
    }

    fn base(&self) -> &DbConnection<MemoryAllocator> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DbConnection<MemoryAllocator> {
        &mut self.base
    }

    fn scan_impl(&mut self, cursor: Cursor, pattern: &str, count: u64) -> NosqlResult<ScanPage> {
        let keys = self.engine()?.keys();
        offset_scan(keys.into_iter().map(Ok), cursor, pattern, count)
    }

    fn keys_impl(&mut self, start: &KeyString, end: &KeyString, limit: u64) -> NosqlResult<Vec<KeyString>> {
        let keys = self.engine()?.keys_after(start);
        range_keys(keys.into_iter().map(Ok), start, end, limit)
    }

    fn db_kcount_impl(&mut self) -> NosqlResult<usize> {
        Ok(self.engine()?.len())
    }

    fn get_impl(&mut self, key: &NKey) -> NosqlResult<NDbKValue> {
        let (value, ttl) = self
            .engine()?
            .get(key.key())
            .ok_or_else(|| NosqlError::key_not_found(&key.key().to_string_lossy()))?;
        Ok(NDbKValue::new(NKey::with_ttl(key.key().clone(), ttl), value))
    }

    fn set_impl(&mut self, key: &NDbKValue) -> NosqlResult<NDbKValue> {
        let name = key.key().key().clone();
        let ttl = match self.engine()?.insert(name.clone(), key.value().clone(), key.key().ttl()) {
            InsertOutcome::Inserted { ttl } | InsertOutcome::Replaced { ttl } => ttl,
            InsertOutcome::Expired => EXPIRED_TTL,
            InsertOutcome::Full => {
                return Err(NosqlError::operation_failed("SET", "maximum number of entries reached"));
            }
        };
        Ok(NDbKValue::new(NKey::with_ttl(name, ttl), key.value().clone()))
    }

    fn delete_key_impl(&mut self, key: &NKey) -> NosqlResult<()> {
        if !self.engine()?.remove(key.key()) {
            return Err(NosqlError::key_not_found(&key.key().to_string_lossy()));
        }
        Ok(())
    }

    fn flush_db_impl(&mut self) -> NosqlResult<()> {
        self.engine()?.clear();
        Ok(())
    }

    fn set_ttl_impl(&mut self, key: &NKey, ttl: Ttl) -> NosqlResult<()> {
        if !self.engine()?.set_ttl(key.key(), ttl) {
            return Err(NosqlError::key_not_found(&key.key().to_string_lossy()));
        }
        Ok(())
    }

    fn get_ttl_impl(&mut self, key: &NKey) -> NosqlResult<Ttl> {
        Ok(self.engine()?.ttl(key.key()))
    }
}
