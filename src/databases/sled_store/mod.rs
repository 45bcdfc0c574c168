//! Sled backend.
//!
//! Every sled tree is one named database. The default tree is exposed as
//! [`DEFAULT_DB_NAME`]; `CREATEDB`, `REMOVEDB` and `SELECT` open, drop and
//! switch trees. Values are stored as raw bytes, so only string and
//! integer values can be written.
//!
//! Sled has no native rename and counts keys by walking the tree, so
//! `RENAME` is get-delete-set and `DBKCOUNT` is O(n).

use std::sync::{Arc, OnceLock};

use crate::command::CommandHolder;
use crate::config::{ConnectionType, SledConfig};
use crate::connection::{CdbConnection, DbConnection, offset_scan, range_keys};
use crate::databases::EmbeddedTranslator;
use crate::error::{NosqlError, NosqlResult};
use crate::traits::{Backend, CommandTranslator, ConnectionAllocator};
use crate::types::{
    Cursor, DEFAULT_DB_NAME, DataBaseInfo, KeyString, NDbKValue, NKey, ScanPage, Value,
};

/// Name sled gives its default tree.
const SLED_DEFAULT_TREE: &[u8] = b"__sled__default";

/// An open sled database and the tree currently selected.
pub struct SledHandle {
    db: sled::Db,
    current: sled::Tree,
}

impl SledHandle {
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    pub fn current_tree(&self) -> &sled::Tree {
        &self.current
    }
}

pub struct SledAllocator;

impl ConnectionAllocator for SledAllocator {
    type Config = SledConfig;
    type Handle = SledHandle;

    const NAME: &'static str = "SledStore";

    fn connect(config: &SledConfig) -> NosqlResult<SledHandle> {
        if !config.temporary && !config.create_if_missing && !config.db_path.is_dir() {
            return Err(NosqlError::InvalidArgument(format!(
                "Invalid input path({})",
                config.db_path.display()
            )));
        }

        let db = sled::Config::new()
            .path(&config.db_path)
            .cache_capacity((config.cache_capacity_mb as u64).saturating_mul(1024 * 1024))
            .temporary(config.temporary)
            .open()
            .map_err(NosqlError::open_failed)?;
        let current = (*db).clone();
        Ok(SledHandle { db, current })
    }

    fn disconnect(handle: SledHandle) {
        let _ = handle.db.flush();
    }

    fn is_connected(_handle: &SledHandle) -> bool {
        true
    }
}

command_table!(SLED_COMMANDS, SledStore, [
    keys_command!(SledStore),
    CommandHolder::new(
        "CREATEDB",
        "<name>",
        "Create database",
        crate::command::version(0, 1, 0),
        "CREATEDB test",
        1,
        1,
        crate::command::handlers::create_db::<SledStore>,
    ),
    CommandHolder::new(
        "REMOVEDB",
        "<name>",
        "Remove database",
        crate::command::version(0, 1, 0),
        "REMOVEDB test",
        1,
        1,
        crate::command::handlers::remove_db::<SledStore>,
    ),
]);

pub struct SledStore {
    base: DbConnection<SledAllocator>,
}

fn tree_name(name: &str) -> Vec<u8> {
    if name == DEFAULT_DB_NAME {
        SLED_DEFAULT_TREE.to_vec()
    } else {
        name.as_bytes().to_vec()
    }
}

fn db_name(tree: &[u8]) -> String {
    if tree == SLED_DEFAULT_TREE {
        DEFAULT_DB_NAME.to_string()
    } else {
        String::from_utf8_lossy(tree).into_owned()
    }
}

fn sled_failed(command: &'static str) -> impl Fn(sled::Error) -> NosqlError {
    move |err| NosqlError::operation_failed(command, err)
}

impl SledStore {
    fn handle(&mut self) -> NosqlResult<&mut SledHandle> {
        self.base.handle_mut()
    }

    fn tree(&self) -> NosqlResult<&sled::Tree> {
        Ok(&self.base.handle()?.current)
    }

    fn has_tree(&self, name: &str) -> NosqlResult<bool> {
        let wanted = tree_name(name);
        Ok(self.base.handle()?.db.tree_names().iter().any(|n| n[..] == wanted[..]))
    }

    /// Every tree with its key count.
    pub fn databases(&self) -> NosqlResult<Vec<DataBaseInfo>> {
        let handle = self.base.handle()?;
        let current = db_name(&handle.current.name());
        let mut out = Vec::new();
        for raw in handle.db.tree_names() {
            let name = db_name(&raw);
            let tree = handle.db.open_tree(&raw).map_err(sled_failed("DATABASES"))?;
            out.push(DataBaseInfo::new(name.clone(), name == current, tree.len()));
        }
        Ok(out)
    }
}

impl Backend for SledStore {
    type Allocator = SledAllocator;

    const CONNECTION_TYPE: ConnectionType = ConnectionType::Sled;

    fn create() -> Self {
        SledStore {
            base: DbConnection::new(),
        }
    }

    fn based_on() -> &'static str {
        "sled"
    }

    fn version_api() -> String {
        "0.34".to_string()
    }

    fn commands() -> &'static [CommandHolder<CdbConnection<Self>>] {
        SLED_COMMANDS
    }

    fn translator(&self) -> Arc<dyn CommandTranslator> {
        static TRANSLATOR: OnceLock<Arc<EmbeddedTranslator>> = OnceLock::new();
        TRANSLATOR
            .get_or_init(|| Arc::new(EmbeddedTranslator::new(SLED_COMMANDS, false)))
            .clone()
    }

    fn base(&self) -> &DbConnection<SledAllocator> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DbConnection<SledAllocator> {
        &mut self.base
    }

    fn scan_impl(&mut self, cursor: Cursor, pattern: &str, count: u64) -> NosqlResult<ScanPage> {
        let keys = self
            .tree()?
            .iter()
            .keys()
            .map(|key| key.map(|k| KeyString::from(k.to_vec())).map_err(sled_failed("SCAN")));
        offset_scan(keys, cursor, pattern, count)
    }

    fn keys_impl(&mut self, start: &KeyString, end: &KeyString, limit: u64) -> NosqlResult<Vec<KeyString>> {
        let keys = self
            .tree()?
            .range::<&[u8], _>(start.as_bytes()..)
            .keys()
            .map(|key| key.map(|k| KeyString::from(k.to_vec())).map_err(sled_failed("KEYS")));
        range_keys(keys, start, end, limit)
    }

    fn db_kcount_impl(&mut self) -> NosqlResult<usize> {
        Ok(self.tree()?.len())
    }

    fn get_impl(&mut self, key: &NKey) -> NosqlResult<NDbKValue> {
        let value = self
            .tree()?
            .get(key.key().as_bytes())
            .map_err(sled_failed("GET"))?
            .ok_or_else(|| NosqlError::key_not_found(&key.key().to_string_lossy()))?;
        Ok(NDbKValue::new(NKey::new(key.key().clone()), Value::string(value.to_vec())))
    }

    fn set_impl(&mut self, key: &NDbKValue) -> NosqlResult<NDbKValue> {
        let bytes = key
            .value()
            .to_storage_bytes()
            .ok_or_else(|| NosqlError::not_supported("SET"))?;
        self.tree()?
            .insert(key.key().key().as_bytes(), bytes)
            .map_err(sled_failed("SET"))?;
        Ok(NDbKValue::new(NKey::new(key.key().key().clone()), key.value().clone()))
    }

    fn delete_key_impl(&mut self, key: &NKey) -> NosqlResult<()> {
        self.tree()?
            .remove(key.key().as_bytes())
            .map_err(sled_failed("DEL"))?
            .ok_or_else(|| NosqlError::key_not_found(&key.key().to_string_lossy()))?;
        Ok(())
    }

    fn flush_db_impl(&mut self) -> NosqlResult<()> {
        self.tree()?.clear().map_err(sled_failed("FLUSHDB"))
    }

    fn select_impl(&mut self, name: &str) -> NosqlResult<DataBaseInfo> {
        if !self.has_tree(name)? {
            return Err(NosqlError::invalid_input_arguments("SELECT"));
        }
        let handle = self.handle()?;
        let tree = handle.db.open_tree(tree_name(name)).map_err(sled_failed("SELECT"))?;
        let keys_count = tree.len();
        handle.current = tree;
        Ok(DataBaseInfo::new(name, true, keys_count))
    }

    fn create_db_impl(&mut self, name: &str) -> NosqlResult<DataBaseInfo> {
        if self.has_tree(name)? {
            return Err(NosqlError::operation_failed("CREATEDB", format!("database {name} already exists")));
        }
        self.handle()?
            .db
            .open_tree(tree_name(name))
            .map_err(sled_failed("CREATEDB"))?;
        Ok(DataBaseInfo::new(name, false, 0))
    }

    fn remove_db_impl(&mut self, name: &str) -> NosqlResult<DataBaseInfo> {
        if name == DEFAULT_DB_NAME {
            return Err(NosqlError::operation_failed("REMOVEDB", "the default database cannot be removed"));
        }
        if self.base.current_db_name() == Some(name) {
            return Err(NosqlError::operation_failed("REMOVEDB", "the selected database cannot be removed"));
        }
        let dropped = self
            .handle()?
            .db
            .drop_tree(tree_name(name))
            .map_err(sled_failed("REMOVEDB"))?;
        if !dropped {
            return Err(NosqlError::NotFound(format!("database not found: {name}")));
        }
        Ok(DataBaseInfo::new(name, false, 0))
    }
}
