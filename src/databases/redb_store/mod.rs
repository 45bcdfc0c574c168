//! Redb backend.
//!
//! One database file with a single `&[u8] -> &[u8]` table, in the shape of
//! LevelDB-style engines: there is exactly one database, named
//! [`DEFAULT_DB_NAME`](crate::types::DEFAULT_DB_NAME), and `SELECT` only accepts that name. Every
//! operation runs in its own transaction.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use log::debug;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};

use crate::command::CommandHolder;
use crate::config::{ConnectionType, RedbConfig};
use crate::connection::{CdbConnection, DbConnection, offset_scan, range_keys};
use crate::databases::EmbeddedTranslator;
use crate::error::{NosqlError, NosqlResult};
use crate::traits::{Backend, CommandTranslator, ConnectionAllocator};
use crate::types::{Cursor, KeyString, NDbKValue, NKey, ScanPage, Value};

const KEYS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("keys");

type KeysTable<'txn> = redb::Table<'txn, &'static [u8], &'static [u8]>;

fn redb_failed<E: Into<redb::Error>>(command: &'static str) -> impl Fn(E) -> NosqlError {
    move |err| {
        let err: redb::Error = err.into();
        NosqlError::operation_failed(command, err)
    }
}

pub struct RedbAllocator;

impl ConnectionAllocator for RedbAllocator {
    type Config = RedbConfig;
    type Handle = Database;

    const NAME: &'static str = "RedbStore";

    fn connect(config: &RedbConfig) -> NosqlResult<Database> {
        let path = &config.db_path;
        let parent_ok = path
            .parent()
            .is_none_or(|parent| parent.as_os_str().is_empty() || parent.is_dir());
        let exists = path.is_file();
        if !parent_ok || (!exists && !config.create_if_missing) {
            return Err(NosqlError::InvalidArgument(format!("Invalid input path({})", path.display())));
        }

        let mut builder = redb::Builder::new();
        builder.set_cache_size(config.cache_size_mb.saturating_mul(1024 * 1024));
        let db = if exists {
            builder.open(path)
        } else {
            builder.create(path)
        }
        .map_err(NosqlError::open_failed)?;

        // The table must exist before the first read transaction.
        let txn = db.begin_write().map_err(NosqlError::open_failed)?;
        txn.open_table(KEYS_TABLE).map_err(NosqlError::open_failed)?;
        txn.commit().map_err(NosqlError::open_failed)?;
        Ok(db)
    }

    fn disconnect(_db: Database) {}

    fn is_connected(_db: &Database) -> bool {
        true
    }
}

command_table!(REDB_COMMANDS, RedbStore, [keys_command!(RedbStore)]);

pub struct RedbStore {
    base: DbConnection<RedbAllocator>,
}

impl RedbStore {
    fn db(&self) -> NosqlResult<&Database> {
        self.base.handle()
    }

    /// Reads every key at or after `start` in one read transaction.
    fn collect_keys(&self, start: Option<&[u8]>, command: &'static str) -> NosqlResult<Vec<NosqlResult<KeyString>>> {
        let txn = self.db()?.begin_read().map_err(redb_failed(command))?;
        let table = txn.open_table(KEYS_TABLE).map_err(redb_failed(command))?;
        let iter = match start {
            Some(start) => table.range(start..),
            None => table.iter(),
        }
        .map_err(redb_failed(command))?;
        Ok(iter
            .map(|entry| {
                entry
                    .map(|(key, _)| KeyString::from(key.value().to_vec()))
                    .map_err(redb_failed(command))
            })
            .collect())
    }

    fn write<T>(
        &self,
        command: &'static str,
        op: impl FnOnce(&mut KeysTable<'_>) -> NosqlResult<T>,
    ) -> NosqlResult<T> {
        let start = Instant::now();
        let txn = self.db()?.begin_write().map_err(redb_failed(command))?;
        let out = {
            let mut table = txn.open_table(KEYS_TABLE).map_err(redb_failed(command))?;
            op(&mut table)?
        };
        txn.commit().map_err(redb_failed(command))?;
        debug!("RedbStore: {} committed in {:?}", command, start.elapsed());
        Ok(out)
    }
}

impl Backend for RedbStore {
    type Allocator = RedbAllocator;

    const CONNECTION_TYPE: ConnectionType = ConnectionType::Redb;

    fn create() -> Self {
        RedbStore {
            base: DbConnection::new(),
        }
    }

    fn based_on() -> &'static str {
        "redb"
    }

    fn version_api() -> String {
        "3.1".to_string()
    }

    fn commands() -> &'static [CommandHolder<CdbConnection<Self>>] {
        REDB_COMMANDS
    }

    fn translator(&self) -> Arc<dyn CommandTranslator> {
        static TRANSLATOR: OnceLock<Arc<EmbeddedTranslator>> = OnceLock::new();
        TRANSLATOR
            .get_or_init(|| Arc::new(EmbeddedTranslator::new(REDB_COMMANDS, false)))
            .clone()
    }

    fn base(&self) -> &DbConnection<RedbAllocator> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DbConnection<RedbAllocator> {
        &mut self.base
    }

    fn scan_impl(&mut self, cursor: Cursor, pattern: &str, count: u64) -> NosqlResult<ScanPage> {
        let keys = self.collect_keys(None, "SCAN")?;
        offset_scan(keys, cursor, pattern, count)
    }

    fn keys_impl(&mut self, start: &KeyString, end: &KeyString, limit: u64) -> NosqlResult<Vec<KeyString>> {
        let keys = self.collect_keys(Some(start.as_bytes()), "KEYS")?;
        range_keys(keys, start, end, limit)
    }

    fn db_kcount_impl(&mut self) -> NosqlResult<usize> {
        let txn = self.db()?.begin_read().map_err(redb_failed("DBKCOUNT"))?;
        let table = txn.open_table(KEYS_TABLE).map_err(redb_failed("DBKCOUNT"))?;
        let len = table.len().map_err(redb_failed("DBKCOUNT"))?;
        Ok(usize::try_from(len).unwrap_or(usize::MAX))
    }

    fn get_impl(&mut self, key: &NKey) -> NosqlResult<NDbKValue> {
        let txn = self.db()?.begin_read().map_err(redb_failed("GET"))?;
        let table = txn.open_table(KEYS_TABLE).map_err(redb_failed("GET"))?;
        let value = table
            .get(key.key().as_bytes())
            .map_err(redb_failed("GET"))?
            .map(|guard| guard.value().to_vec())
            .ok_or_else(|| NosqlError::key_not_found(&key.key().to_string_lossy()))?;
        Ok(NDbKValue::new(NKey::new(key.key().clone()), Value::string(value)))
    }

    fn set_impl(&mut self, key: &NDbKValue) -> NosqlResult<NDbKValue> {
        let bytes = key
            .value()
            .to_storage_bytes()
            .ok_or_else(|| NosqlError::not_supported("SET"))?;
        self.write("SET", |table| {
            table
                .insert(key.key().key().as_bytes(), bytes.as_slice())
                .map_err(redb_failed("SET"))?;
            Ok(())
        })?;
        Ok(NDbKValue::new(NKey::new(key.key().key().clone()), key.value().clone()))
    }

    fn delete_key_impl(&mut self, key: &NKey) -> NosqlResult<()> {
        let removed = self.write("DEL", |table| {
            Ok(table
                .remove(key.key().as_bytes())
                .map_err(redb_failed("DEL"))?
                .is_some())
        })?;
        if !removed {
            return Err(NosqlError::key_not_found(&key.key().to_string_lossy()));
        }
        Ok(())
    }

    fn flush_db_impl(&mut self) -> NosqlResult<()> {
        self.write("FLUSHDB", |table| {
            table.retain(|_, _| false).map_err(redb_failed("FLUSHDB"))
        })
    }
}
