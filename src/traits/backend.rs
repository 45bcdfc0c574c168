//! The per-backend hook set behind [`CdbConnection`].
//!
//! `CdbConnection` owns the guards, notifications and command dispatch; a
//! backend only supplies the raw operations. Composite operations (delete
//! of many keys, rename, flush, select) have default bodies built from the
//! required hooks, matching what engines without a native primitive do.
//! Backends with a native primitive override them.

use std::sync::Arc;

use log::warn;

use crate::command::holder::CommandHolder;
use crate::config::ConnectionType;
use crate::connection::{CdbConnection, DbConnection};
use crate::error::{NosqlError, NosqlResult};
use crate::traits::allocator::ConnectionAllocator;
use crate::traits::translator::CommandTranslator;
use crate::types::{
    ALL_KEYS_PATTERN, Cursor, DataBaseInfo, KeyString, NDbKValue, NKey, NKeys, NO_KEYS_LIMIT,
    ScanPage, Ttl, Value,
};

pub trait Backend: Sized + Send + 'static {
    type Allocator: ConnectionAllocator;

    const CONNECTION_TYPE: ConnectionType;

    /// Separator between the children of an `execute` result.
    const DELIMITER: &'static str = "\n";

    /// `COUNT` used by `SCAN` when the command line gives none.
    const DEFAULT_SCAN_COUNT: u64 = NO_KEYS_LIMIT;

    /// A disconnected adapter.
    fn create() -> Self;

    /// Name of the engine the backend is built on.
    fn based_on() -> &'static str;

    fn version_api() -> String;

    fn commands() -> &'static [CommandHolder<CdbConnection<Self>>];

    fn translator(&self) -> Arc<dyn CommandTranslator>;

    fn base(&self) -> &DbConnection<Self::Allocator>;

    fn base_mut(&mut self) -> &mut DbConnection<Self::Allocator>;

    /// Runs right after the handle was opened. An error here makes
    /// `connect` close the handle again.
    fn on_connected(&mut self) -> NosqlResult<()> {
        let base = self.base_mut();
        base.set_authenticated(true);
        base.set_current_db_name(crate::types::DEFAULT_DB_NAME);
        Ok(())
    }

    /// Runs right before the handle is closed.
    fn on_disconnecting(&mut self) {}

    fn scan_impl(&mut self, cursor: Cursor, pattern: &str, count: u64) -> NosqlResult<ScanPage>;

    /// Keys with `start < key < end`, at most `limit` of them.
    fn keys_impl(&mut self, start: &KeyString, end: &KeyString, limit: u64) -> NosqlResult<Vec<KeyString>>;

    fn db_kcount_impl(&mut self) -> NosqlResult<usize>;

    /// Fails with `NotFound` when the key is absent.
    fn get_impl(&mut self, key: &NKey) -> NosqlResult<NDbKValue>;

    /// Stores the record, returning what was actually stored.
    fn set_impl(&mut self, key: &NDbKValue) -> NosqlResult<NDbKValue>;

    /// Removes one key; fails with `NotFound` when it is absent.
    fn delete_key_impl(&mut self, key: &NKey) -> NosqlResult<()>;

    /// Deletes key by key, skipping failures. Returns the removed keys.
    fn delete_impl(&mut self, keys: &[NKey]) -> NosqlResult<NKeys> {
        let mut deleted = Vec::with_capacity(keys.len());
        for key in keys {
            match self.delete_key_impl(key) {
                Ok(()) => deleted.push(key.clone()),
                Err(err) if err.is_not_found() => {}
                Err(err) => warn!("{}: skipping delete of {}: {}", Self::CONNECTION_TYPE, key, err),
            }
        }
        Ok(deleted)
    }

    /// Get, delete, set. Not atomic: a failure after the delete loses the record.
    fn rename_impl(&mut self, key: &NKey, new_key: &KeyString) -> NosqlResult<()> {
        let loaded = self.get_impl(key)?;
        self.delete_key_impl(key)?;
        let moved = NDbKValue::new(NKey::with_ttl(new_key.clone(), loaded.key().ttl()), loaded.value().clone());
        self.set_impl(&moved)?;
        Ok(())
    }

    /// Scans every key and deletes each one. Not atomic.
    fn flush_db_impl(&mut self) -> NosqlResult<()> {
        let mut cursor = 0;
        let mut keys = Vec::new();
        loop {
            let page = self.scan_impl(cursor, ALL_KEYS_PATTERN, NO_KEYS_LIMIT)?;
            keys.extend(page.keys);
            if page.cursor == 0 {
                break;
            }
            cursor = page.cursor;
        }
        for key in keys {
            self.delete_key_impl(&NKey::new(key))?;
        }
        Ok(())
    }

    /// Single-database engines: only the open database can be selected.
    fn select_impl(&mut self, name: &str) -> NosqlResult<DataBaseInfo> {
        if self.base().current_db_name() != Some(name) {
            return Err(NosqlError::invalid_input_arguments("SELECT"));
        }
        let keys_count = self.db_kcount_impl()?;
        Ok(DataBaseInfo::new(name, true, keys_count))
    }

    fn create_db_impl(&mut self, _name: &str) -> NosqlResult<DataBaseInfo> {
        Err(NosqlError::not_supported("CREATEDB"))
    }

    fn remove_db_impl(&mut self, _name: &str) -> NosqlResult<DataBaseInfo> {
        Err(NosqlError::not_supported("REMOVEDB"))
    }

    fn set_ttl_impl(&mut self, _key: &NKey, _ttl: Ttl) -> NosqlResult<()> {
        Err(ttl_not_supported::<Self>())
    }

    fn get_ttl_impl(&mut self, _key: &NKey) -> NosqlResult<Ttl> {
        Err(ttl_not_supported::<Self>())
    }

    /// Server/engine description for `INFO`.
    fn info_impl(&mut self, _section: Option<&str>) -> NosqlResult<Value> {
        let keys = self.db_kcount_impl()?;
        let db = self.base().current_db_name().unwrap_or_default().to_string();
        Ok(Value::Hash(vec![
            (b"backend".to_vec(), Self::CONNECTION_TYPE.to_string().into_bytes()),
            (b"based_on".to_vec(), Self::based_on().as_bytes().to_vec()),
            (b"version".to_vec(), Self::version_api().into_bytes()),
            (b"current_db".to_vec(), db.into_bytes()),
            (b"keys".to_vec(), keys.to_string().into_bytes()),
        ]))
    }
}

fn ttl_not_supported<B: Backend>() -> NosqlError {
    NosqlError::NotSupported(format!(
        "Sorry, but {} does not support TTL commands.",
        B::CONNECTION_TYPE
    ))
}
