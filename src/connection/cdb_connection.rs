//! The public face of a connection: guarded verbs, client notifications,
//! command execution and help.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use log::{debug, trace};

use crate::command::args::{parse_commands, split_args};
use crate::command::output::FastoObject;
use crate::config::ConnectionType;
use crate::error::{NosqlError, NosqlResult};
use crate::traits::{Backend, CommandTranslator, ConnectionAllocator, ConnectionClient, Session};
use crate::types::{Cursor, DataBaseInfo, KeyString, NDbKValue, NKey, NKeys, ScanPage, Ttl};

/// Config type accepted by backend `B`.
pub type ConfigOf<B> = <<B as Backend>::Allocator as ConnectionAllocator>::Config;

const HELP_TITLE: &str = env!("CARGO_PKG_NAME");

/// A backend adapter plus the guards and notifications every verb shares.
///
/// Every data verb checks the connection and authentication state before
/// reaching the backend, and reports to the client only after the backend
/// call succeeded.
pub struct CdbConnection<B: Backend> {
    backend: B,
    translator: Arc<dyn CommandTranslator>,
    client: Option<Box<dyn ConnectionClient>>,
}

impl<B: Backend> CdbConnection<B> {
    pub fn new(client: Option<Box<dyn ConnectionClient>>) -> Self {
        let backend = B::create();
        let translator = backend.translator();
        CdbConnection {
            backend,
            translator,
            client,
        }
    }

    pub fn set_client(&mut self, client: Option<Box<dyn ConnectionClient>>) {
        self.client = client;
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn translator(&self) -> Arc<dyn CommandTranslator> {
        Arc::clone(&self.translator)
    }

    pub fn connection_type(&self) -> ConnectionType {
        B::CONNECTION_TYPE
    }

    /// Opens the handle and runs the backend's post-connect steps. If those
    /// fail, the handle is closed again before the error is returned.
    pub fn connect(&mut self, config: ConfigOf<B>) -> NosqlResult<()> {
        self.backend.base_mut().connect(config)?;
        if let Err(err) = self.backend.on_connected() {
            debug!("{}: post-connect failed: {}", B::CONNECTION_TYPE, err);
            self.backend.base_mut().disconnect();
            return Err(err);
        }
        Ok(())
    }

    /// Closes the handle; a no-op when already disconnected.
    pub fn disconnect(&mut self) -> NosqlResult<()> {
        if self.backend.base().is_connected() {
            self.backend.on_disconnecting();
        }
        self.backend.base_mut().disconnect();
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.backend.base().is_connected()
    }

    pub fn is_authenticated(&self) -> bool {
        self.backend.base().is_authenticated()
    }

    pub fn current_db_name(&self) -> Option<String> {
        self.backend.base().current_db_name().map(str::to_string)
    }

    pub fn test_is_connected(&self) -> NosqlResult<()> {
        self.backend.base().test_is_connected()
    }

    pub fn test_is_authenticated(&self) -> NosqlResult<()> {
        self.backend.base().test_is_authenticated()
    }

    pub fn get(&mut self, key: &NKey) -> NosqlResult<NDbKValue> {
        self.test_is_authenticated()?;
        check_key(key)?;
        let loaded = self.backend.get_impl(key)?;
        self.notify(|client| client.on_loaded_key(&loaded));
        Ok(loaded)
    }

    pub fn set(&mut self, key: &NDbKValue) -> NosqlResult<NDbKValue> {
        self.test_is_authenticated()?;
        check_key(key.key())?;
        let added = self.backend.set_impl(key)?;
        self.notify(|client| client.on_added_key(&added));
        Ok(added)
    }

    /// Deletes what it can and returns the keys that were removed. Missing
    /// keys are not an error.
    pub fn delete(&mut self, keys: &[NKey]) -> NosqlResult<NKeys> {
        self.test_is_authenticated()?;
        let deleted = self.backend.delete_impl(keys)?;
        self.notify(|client| client.on_removed_keys(&deleted));
        Ok(deleted)
    }

    pub fn rename(&mut self, key: &NKey, new_key: &KeyString) -> NosqlResult<()> {
        self.test_is_authenticated()?;
        check_key(key)?;
        if new_key.is_empty() {
            return Err(NosqlError::invalid_input());
        }
        self.backend.rename_impl(key, new_key)?;
        self.notify(|client| client.on_renamed_key(key, new_key));
        Ok(())
    }

    /// One page of keys matching `pattern`. Feed the returned cursor back
    /// until it is `0`.
    pub fn scan(&mut self, cursor: Cursor, pattern: &str, count: u64) -> NosqlResult<ScanPage> {
        self.test_is_authenticated()?;
        if count == 0 {
            return Err(NosqlError::invalid_input_arguments("SCAN"));
        }
        self.backend.scan_impl(cursor, pattern, count)
    }

    pub fn keys(&mut self, start: &KeyString, end: &KeyString, limit: u64) -> NosqlResult<Vec<KeyString>> {
        self.test_is_authenticated()?;
        self.backend.keys_impl(start, end, limit)
    }

    /// Number of keys in the current database. O(n) on engines without a
    /// native counter.
    pub fn db_kcount(&mut self) -> NosqlResult<usize> {
        self.test_is_authenticated()?;
        self.backend.db_kcount_impl()
    }

    pub fn flush_db(&mut self) -> NosqlResult<()> {
        self.test_is_authenticated()?;
        self.backend.flush_db_impl()?;
        self.notify(|client| client.on_flushed_current_db());
        Ok(())
    }

    pub fn select(&mut self, name: &str) -> NosqlResult<DataBaseInfo> {
        self.test_is_authenticated()?;
        if name.is_empty() {
            return Err(NosqlError::invalid_input());
        }
        let info = self.backend.select_impl(name)?;
        self.backend.base_mut().set_current_db_name(info.name());
        self.notify(|client| client.on_changed_current_db(&info));
        Ok(info)
    }

    pub fn create_database(&mut self, name: &str) -> NosqlResult<DataBaseInfo> {
        self.test_is_authenticated()?;
        if name.is_empty() {
            return Err(NosqlError::invalid_input());
        }
        let info = self.backend.create_db_impl(name)?;
        self.notify(|client| client.on_created_db(&info));
        Ok(info)
    }

    pub fn remove_database(&mut self, name: &str) -> NosqlResult<DataBaseInfo> {
        self.test_is_authenticated()?;
        if name.is_empty() {
            return Err(NosqlError::invalid_input());
        }
        let info = self.backend.remove_db_impl(name)?;
        self.notify(|client| client.on_removed_db(&info));
        Ok(info)
    }

    pub fn set_ttl(&mut self, key: &NKey, ttl: Ttl) -> NosqlResult<()> {
        self.test_is_authenticated()?;
        check_key(key)?;
        self.backend.set_ttl_impl(key, ttl)?;
        self.notify(|client| client.on_changed_key_ttl(key, ttl));
        Ok(())
    }

    pub fn get_ttl(&mut self, key: &NKey) -> NosqlResult<Ttl> {
        self.test_is_authenticated()?;
        check_key(key)?;
        let ttl = self.backend.get_ttl_impl(key)?;
        self.notify(|client| client.on_loaded_key_ttl(key, ttl));
        Ok(ttl)
    }

    pub fn info(&mut self, section: Option<&str>) -> NosqlResult<crate::types::Value> {
        self.test_is_authenticated()?;
        self.backend.info_impl(section)
    }

    pub fn quit(&mut self) -> NosqlResult<()> {
        self.test_is_connected()?;
        self.disconnect()?;
        self.notify(|client| client.on_quited());
        Ok(())
    }

    /// Help for one command, or a usage line when `argv` is empty.
    pub fn help(&self, argv: &[Vec<u8>]) -> NosqlResult<String> {
        if argv.is_empty() {
            return Ok(format!(
                "{HELP_TITLE} based on {} {} \r\nType: \"help <command>\" for help on <command>\r\n",
                B::based_on(),
                B::version_api()
            ));
        }
        let (info, _) = self.translator.find_command(argv)?;
        Ok(format!(
            "name: {}\nsummary: {}\nparams: {}\nsince: {}\nexample: {}\r\n",
            info.name,
            info.summary,
            info.params,
            info.since_readable(),
            info.example
        ))
    }

    /// Runs every non-blank line of `input` as a command, stopping at the
    /// first failure. Each command appends one child to the result.
    pub fn execute(&mut self, input: &[u8]) -> NosqlResult<FastoObject> {
        let mut root = FastoObject::root(B::DELIMITER);
        for line in parse_commands(input) {
            trace!("{}: execute {}", B::CONNECTION_TYPE, String::from_utf8_lossy(&line));
            let argv = split_args(&line)?;
            if argv.is_empty() {
                continue;
            }
            let (info, offset) = self.translator.test_command_line_args(&argv)?;
            let holder = B::commands()
                .iter()
                .find(|holder| holder.info.name == info.name)
                .ok_or_else(|| NosqlError::unknown_sequence(&argv))?;
            (holder.func)(self, &argv[offset..], &mut root)?;
        }
        Ok(root)
    }

    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.backend.base().interrupt_handle()
    }

    pub fn set_interrupted(&self, interrupted: bool) {
        self.backend.base().set_interrupted(interrupted);
    }

    pub fn is_interrupted(&self) -> bool {
        self.backend.base().is_interrupted()
    }

    fn notify(&mut self, event: impl FnOnce(&mut dyn ConnectionClient)) {
        if let Some(client) = self.client.as_deref_mut() {
            event(client);
        }
    }
}

fn check_key(key: &NKey) -> NosqlResult<()> {
    if key.key().is_empty() {
        return Err(NosqlError::invalid_input());
    }
    Ok(())
}

impl<B: Backend> Session for CdbConnection<B> {
    fn connection_type(&self) -> ConnectionType {
        B::CONNECTION_TYPE
    }

    fn is_connected(&self) -> bool {
        CdbConnection::is_connected(self)
    }

    fn is_authenticated(&self) -> bool {
        CdbConnection::is_authenticated(self)
    }

    fn current_db_name(&self) -> Option<String> {
        CdbConnection::current_db_name(self)
    }

    fn disconnect(&mut self) -> NosqlResult<()> {
        CdbConnection::disconnect(self)
    }

    fn get(&mut self, key: &NKey) -> NosqlResult<NDbKValue> {
        CdbConnection::get(self, key)
    }

    fn set(&mut self, key: &NDbKValue) -> NosqlResult<NDbKValue> {
        CdbConnection::set(self, key)
    }

    fn delete(&mut self, keys: &[NKey]) -> NosqlResult<NKeys> {
        CdbConnection::delete(self, keys)
    }

    fn rename(&mut self, key: &NKey, new_key: &KeyString) -> NosqlResult<()> {
        CdbConnection::rename(self, key, new_key)
    }

    fn scan(&mut self, cursor: Cursor, pattern: &str, count: u64) -> NosqlResult<ScanPage> {
        CdbConnection::scan(self, cursor, pattern, count)
    }

    fn keys(&mut self, start: &KeyString, end: &KeyString, limit: u64) -> NosqlResult<Vec<KeyString>> {
        CdbConnection::keys(self, start, end, limit)
    }

    fn db_kcount(&mut self) -> NosqlResult<usize> {
        CdbConnection::db_kcount(self)
    }

    fn flush_db(&mut self) -> NosqlResult<()> {
        CdbConnection::flush_db(self)
    }

    fn select(&mut self, name: &str) -> NosqlResult<DataBaseInfo> {
        CdbConnection::select(self, name)
    }

    fn create_database(&mut self, name: &str) -> NosqlResult<DataBaseInfo> {
        CdbConnection::create_database(self, name)
    }

    fn remove_database(&mut self, name: &str) -> NosqlResult<DataBaseInfo> {
        CdbConnection::remove_database(self, name)
    }

    fn set_ttl(&mut self, key: &NKey, ttl: Ttl) -> NosqlResult<()> {
        CdbConnection::set_ttl(self, key, ttl)
    }

    fn get_ttl(&mut self, key: &NKey) -> NosqlResult<Ttl> {
        CdbConnection::get_ttl(self, key)
    }

    fn quit(&mut self) -> NosqlResult<()> {
        CdbConnection::quit(self)
    }

    fn help(&self, argv: &[Vec<u8>]) -> NosqlResult<String> {
        CdbConnection::help(self, argv)
    }

    fn execute(&mut self, input: &[u8]) -> NosqlResult<FastoObject> {
        CdbConnection::execute(self, input)
    }

    fn interrupt_handle(&self) -> Arc<AtomicBool> {
        CdbConnection::interrupt_handle(self)
    }

    fn set_client(&mut self, client: Option<Box<dyn ConnectionClient>>) {
        CdbConnection::set_client(self, client)
    }
}
