//! Redis backend over the blocking `redis` client.
//!
//! Databases are the server's numbered keyspaces; `SELECT 3` switches the
//! connection to keyspace 3. Every key operation is rendered by
//! [`RedisTranslator`] first and the rendered line is what goes over the
//! wire, so `execute` and the typed verbs share one code path.
//!
//! `subscribe` and `monitor` block until the connection's interruption
//! flag is raised from another thread:
//!
//! ```no_run
//! use std::sync::atomic::Ordering;
//! use nosql_core::config::RedisConfig;
//! use nosql_core::connection::CdbConnection;
//! use nosql_core::databases::RedisStore;
//!
//! let mut conn = CdbConnection::<RedisStore>::new(None);
//! conn.connect(RedisConfig::default()).unwrap();
//! let stop = conn.interrupt_handle();
//! std::thread::spawn(move || {
//!     std::thread::sleep(std::time::Duration::from_secs(5));
//!     stop.store(true, Ordering::SeqCst);
//! });
//! let result = conn.backend_mut().subscribe(&["news"], |message| println!("{message}"));
//! assert!(result.is_err());
//! ```

pub mod commands;
mod reply;
pub mod translator;

use std::net::ToSocketAddrs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use log::{debug, trace};
use redis::{ConnectionLike, RedisResult};

use crate::command::CommandHolder;
use crate::command::args::split_args;
use crate::config::{ConnectionType, RedisConfig};
use crate::connection::{CdbConnection, DbConnection};
use crate::error::{NosqlError, NosqlResult};
use crate::traits::translator::{
    DB_DELETE_KEY_COMMAND, DB_GET_KEY_COMMAND, DB_GET_TTL_COMMAND, DB_RENAME_KEY_COMMAND,
    DB_SELECTDB_COMMAND, DB_SET_KEY_COMMAND, DB_SET_TTL_COMMAND,
};
use crate::traits::{Backend, CommandTranslator, ConnectionAllocator};
use crate::types::{
    Cursor, DataBaseInfo, EXPIRED_TTL, KeyString, NDbKValue, NKey, NO_TTL, ScanPage, Ttl, Value, ValueType,
};

use reply::{integer_of, map_error, scan_page, to_value, typed_value, value_type_of};
pub use translator::RedisTranslator;

/// Read timeout of the listen loops, i.e. how often they look at the
/// interruption flag.
const LISTEN_POLL: Duration = Duration::from_millis(100);

pub struct RedisAllocator;

impl ConnectionAllocator for RedisAllocator {
    type Config = RedisConfig;
    type Handle = redis::Connection;

    const NAME: &'static str = "RedisStore";

    fn connect(config: &RedisConfig) -> NosqlResult<redis::Connection> {
        if config.host.is_empty() {
            return Err(NosqlError::InvalidArgument("Invalid input host".to_string()));
        }
        let resolved = (config.host.as_str(), config.port)
            .to_socket_addrs()
            .map_err(NosqlError::connect_failed)?
            .next();
        if resolved.is_none() {
            return Err(NosqlError::connect_failed(format!("can't resolve {}", config.host)));
        }

        let info = redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(config.host.clone(), config.port),
            redis: redis::RedisConnectionInfo::default(),
        };
        let client = redis::Client::open(info).map_err(NosqlError::connect_failed)?;
        client
            .get_connection_with_timeout(Duration::from_millis(config.connect_timeout_ms))
            .map_err(NosqlError::connect_failed)
    }

    fn disconnect(_connection: redis::Connection) {}

    fn is_connected(connection: &redis::Connection) -> bool {
        connection.is_open()
    }
}

command_table!(REDIS_COMMANDS, RedisStore, [
    expire_command!(RedisStore),
    ttl_command!(RedisStore),
    CommandHolder::new(
        "DBSIZE",
        "-",
        "Return the number of keys in the selected database",
        crate::command::version(1, 0, 0),
        "DBSIZE",
        0,
        0,
        commands::dbsize,
    ),
    CommandHolder::new(
        "PUBLISH",
        "<channel> <message>",
        "Post a message to a channel",
        crate::command::version(2, 0, 0),
        "PUBLISH chat hello",
        2,
        2,
        commands::publish,
    ),
    CommandHolder::new(
        "SUBSCRIBE",
        "<channel> [channel ...]",
        "Listen for messages published to the given channels",
        crate::command::version(2, 0, 0),
        "SUBSCRIBE chat",
        1,
        crate::command::INFINITE_COMMAND_ARGS,
        commands::subscribe,
    ),
    CommandHolder::new(
        "MONITOR",
        "-",
        "Listen for all requests received by the server in real time",
        crate::command::version(1, 0, 0),
        "MONITOR",
        0,
        0,
        commands::monitor,
    ),
]);

fn redis_translator() -> Arc<RedisTranslator> {
    static TRANSLATOR: OnceLock<Arc<RedisTranslator>> = OnceLock::new();
    TRANSLATOR
        .get_or_init(|| Arc::new(RedisTranslator::new(REDIS_COMMANDS)))
        .clone()
}

pub struct RedisStore {
    base: DbConnection<RedisAllocator>,
    translator: Arc<RedisTranslator>,
}

impl RedisStore {
    fn connection(&mut self) -> NosqlResult<&mut redis::Connection> {
        self.base.handle_mut()
    }

    fn query(&mut self, cmd: &redis::Cmd, command: &str) -> NosqlResult<redis::Value> {
        let connection = self.connection()?;
        cmd.query::<redis::Value>(connection)
            .map_err(|err| map_error(command, err))
    }

    /// Sends one rendered command line.
    fn run(&mut self, line: &[u8], command: &str) -> NosqlResult<redis::Value> {
        trace!("RedisStore: {}", String::from_utf8_lossy(line));
        let mut cmd = redis::Cmd::new();
        for arg in split_args(line)? {
            cmd.arg(arg);
        }
        self.query(&cmd, command)
    }

    /// Drops the connection and opens a new one with the same config,
    /// back on the database that was selected before.
    fn reopen(&mut self) -> NosqlResult<()> {
        let config = self.base.config().cloned().ok_or(NosqlError::NotConnected)?;
        let current_db = self.base.current_db_name().map(str::to_string);
        self.base.disconnect();
        self.base.connect(config)?;
        self.on_connected()?;

        match current_db {
            Some(db) if self.base.current_db_name() != Some(db.as_str()) => {
                let line = self.translator.select_db_command(&db)?;
                self.run(&line, DB_SELECTDB_COMMAND)?;
                self.base.set_current_db_name(db);
            }
            _ => {}
        }
        Ok(())
    }

    /// Posts `message` to `channel`, returning the number of receivers.
    pub fn publish(&mut self, channel: &str, message: &[u8]) -> NosqlResult<i64> {
        self.base.test_is_authenticated()?;
        let line = self.translator.publish_command(channel, message)?;
        let reply = self.run(&line, "PUBLISH")?;
        integer_of("PUBLISH", &reply)
    }

    /// Hands every message published on `channels` to `sink` as
    /// `["message", channel, payload]` until interrupted.
    ///
    /// Always ends with an error; [`NosqlError::Interrupted`] is the normal
    /// way out.
    pub fn subscribe<S: AsRef<str>>(&mut self, channels: &[S], mut sink: impl FnMut(Value)) -> NosqlResult<()> {
        self.base.test_is_authenticated()?;
        let line = self.translator.subscribe_command(channels)?;
        trace!("RedisStore: {}", String::from_utf8_lossy(&line));

        let interrupted = self.base.interrupt_handle();
        let mut pubsub = self.connection()?.as_pubsub();
        for channel in channels {
            pubsub
                .subscribe(channel.as_ref())
                .map_err(|err| map_error("SUBSCRIBE", err))?;
        }
        pubsub
            .set_read_timeout(Some(LISTEN_POLL))
            .map_err(|err| map_error("SUBSCRIBE", err))?;

        let result = listen(&interrupted, "SUBSCRIBE", &mut sink, || {
            pubsub.get_message().map(|message| {
                Value::Array(vec![
                    Value::from("message"),
                    Value::from(message.get_channel_name()),
                    Value::string(message.get_payload_bytes()),
                ])
            })
        });
        let _ = pubsub.set_read_timeout(None);
        result
    }

    /// Hands every command the server receives to `sink` until
    /// interrupted. The connection is reopened afterwards since a
    /// monitoring connection cannot run other commands.
    pub fn monitor(&mut self, mut sink: impl FnMut(Value)) -> NosqlResult<()> {
        self.base.test_is_authenticated()?;
        let interrupted = self.base.interrupt_handle();
        let connection = self.connection()?;
        redis::cmd("MONITOR")
            .query::<()>(connection)
            .map_err(|err| map_error("MONITOR", err))?;
        connection
            .set_read_timeout(Some(LISTEN_POLL))
            .map_err(|err| map_error("MONITOR", err))?;

        let result = listen(&interrupted, "MONITOR", &mut sink, || {
            connection.recv_response().map(to_value)
        });
        debug!("RedisStore: monitor finished, reopening connection");
        result.and(self.reopen())
    }
}

/// Reads until `interrupted` is raised, clearing the flag on the way out.
fn listen(
    interrupted: &AtomicBool,
    command: &str,
    sink: &mut impl FnMut(Value),
    mut next: impl FnMut() -> RedisResult<Value>,
) -> NosqlResult<()> {
    loop {
        if interrupted.swap(false, Ordering::SeqCst) {
            return Err(NosqlError::Interrupted);
        }
        match next() {
            Ok(value) => sink(value),
            Err(err) if err.is_timeout() => {}
            Err(err) => return Err(map_error(command, err)),
        }
    }
}

impl Backend for RedisStore {
    type Allocator = RedisAllocator;

    const CONNECTION_TYPE: ConnectionType = ConnectionType::Redis;

    const DEFAULT_SCAN_COUNT: u64 = 10;

    fn create() -> Self {
        RedisStore {
            base: DbConnection::new(),
            translator: redis_translator(),
        }
    }

    fn based_on() -> &'static str {
        "redis-rs"
    }

    fn version_api() -> String {
        "0.27".to_string()
    }

    fn commands() -> &'static [CommandHolder<CdbConnection<Self>>] {
        REDIS_COMMANDS
    }

    fn translator(&self) -> Arc<dyn CommandTranslator> {
        self.translator.clone()
    }

    fn base(&self) -> &DbConnection<RedisAllocator> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DbConnection<RedisAllocator> {
        &mut self.base
    }

    /// `AUTH` when a password is configured, then `SELECT db_num`.
    fn on_connected(&mut self) -> NosqlResult<()> {
        let config = self.base.config().cloned().ok_or(NosqlError::NotConnected)?;
        if let Some(password) = &config.password {
            let mut auth = redis::cmd("AUTH");
            if let Some(user) = &config.user {
                auth.arg(user);
            }
            auth.arg(password);
            self.query(&auth, "AUTH")?;
        }
        self.base.set_authenticated(true);

        let db = config.db_num.to_string();
        let line = self.translator.select_db_command(&db)?;
        self.run(&line, DB_SELECTDB_COMMAND)?;
        self.base.set_current_db_name(db);
        Ok(())
    }

    fn scan_impl(&mut self, cursor: Cursor, pattern: &str, count: u64) -> NosqlResult<ScanPage> {
        // The server parses COUNT as a signed 64-bit integer.
        let count = count.min(i64::MAX as u64);
        let line = self.translator.scan_command(cursor, pattern, count);
        let reply = self.run(&line, "SCAN")?;
        scan_page(reply)
    }

    fn keys_impl(&mut self, _start: &KeyString, _end: &KeyString, _limit: u64) -> NosqlResult<Vec<KeyString>> {
        Err(NosqlError::not_supported("KEYS"))
    }

    fn db_kcount_impl(&mut self) -> NosqlResult<usize> {
        let reply = self.query(&redis::cmd("DBSIZE"), "DBSIZE")?;
        let count = integer_of("DBSIZE", &reply)?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn get_impl(&mut self, key: &NKey) -> NosqlResult<NDbKValue> {
        let line = self.translator.type_command(key)?;
        let reply = self.run(&line, "TYPE")?;
        let value_type = value_type_of(&reply)?
            .ok_or_else(|| NosqlError::key_not_found(&key.key().to_string_lossy()))?;

        let line = self.translator.load_key_command(key, value_type)?;
        let reply = self.run(&line, DB_GET_KEY_COMMAND)?;
        if reply == redis::Value::Nil {
            return Err(NosqlError::key_not_found(&key.key().to_string_lossy()));
        }
        Ok(NDbKValue::new(NKey::new(key.key().clone()), typed_value(value_type, reply)))
    }

    fn set_impl(&mut self, key: &NDbKValue) -> NosqlResult<NDbKValue> {
        let line = self.translator.create_key_command(key)?;
        if !matches!(key.value_type(), ValueType::String | ValueType::Integer) {
            // Collection commands append; start from an empty key.
            let del = self.translator.delete_key_command(key.key())?;
            self.run(&del, DB_DELETE_KEY_COMMAND)?;
        }
        self.run(&line, DB_SET_KEY_COMMAND)?;

        let ttl = key.key().ttl();
        if ttl == NO_TTL {
            return Ok(key.clone());
        }
        // The server deletes the key for a non-positive expiry.
        let line = self.translator.change_key_ttl_command(key.key(), ttl)?;
        self.run(&line, DB_SET_TTL_COMMAND)?;
        if ttl <= 0 {
            return Ok(NDbKValue::new(NKey::with_ttl(key.key().key().clone(), EXPIRED_TTL), key.value().clone()));
        }
        Ok(key.clone())
    }

    fn delete_key_impl(&mut self, key: &NKey) -> NosqlResult<()> {
        let line = self.translator.delete_key_command(key)?;
        let reply = self.run(&line, DB_DELETE_KEY_COMMAND)?;
        if integer_of(DB_DELETE_KEY_COMMAND, &reply)? == 0 {
            return Err(NosqlError::key_not_found(&key.key().to_string_lossy()));
        }
        Ok(())
    }

    fn rename_impl(&mut self, key: &NKey, new_key: &KeyString) -> NosqlResult<()> {
        let line = self.translator.rename_key_command(key, new_key)?;
        self.run(&line, DB_RENAME_KEY_COMMAND)?;
        Ok(())
    }

    fn flush_db_impl(&mut self) -> NosqlResult<()> {
        let line = self.translator.flush_db_command();
        self.run(&line, "FLUSHDB")?;
        Ok(())
    }

    fn select_impl(&mut self, name: &str) -> NosqlResult<DataBaseInfo> {
        match name.parse::<i64>() {
            Ok(index) if index >= 0 => {}
            _ => return Err(NosqlError::invalid_input_arguments(DB_SELECTDB_COMMAND)),
        }
        let line = self.translator.select_db_command(name)?;
        self.run(&line, DB_SELECTDB_COMMAND)?;
        let keys_count = self.db_kcount_impl()?;
        Ok(DataBaseInfo::new(name, true, keys_count))
    }

    fn set_ttl_impl(&mut self, key: &NKey, ttl: Ttl) -> NosqlResult<()> {
        let line = self.translator.change_key_ttl_command(key, ttl)?;
        let reply = self.run(&line, DB_SET_TTL_COMMAND)?;
        // PERSIST answers 0 for keys that had no expiry as well.
        if ttl != NO_TTL && integer_of(DB_SET_TTL_COMMAND, &reply)? == 0 {
            return Err(NosqlError::key_not_found(&key.key().to_string_lossy()));
        }
        Ok(())
    }

    fn get_ttl_impl(&mut self, key: &NKey) -> NosqlResult<Ttl> {
        let line = self.translator.load_key_ttl_command(key)?;
        let reply = self.run(&line, DB_GET_TTL_COMMAND)?;
        integer_of(DB_GET_TTL_COMMAND, &reply)
    }

    fn info_impl(&mut self, section: Option<&str>) -> NosqlResult<Value> {
        let mut cmd = redis::cmd("INFO");
        if let Some(section) = section {
            cmd.arg(section);
        }
        let reply = self.query(&cmd, "INFO")?;
        Ok(to_value(reply))
    }
}
