//! Backend adapters.
//!
//! | Backend  | Named databases | TTL | Native cursor |
//! |----------|-----------------|-----|---------------|
//! | `sled`   | yes (trees)     | no  | no            |
//! | `redb`   | no              | no  | no            |
//! | `redis`  | numbered        | yes | yes           |
//! | `memory` | no              | yes | no            |
//!
//! Engines without a native cursor page with an offset cursor (see
//! [`offset_scan`](crate::connection::offset_scan)); every page walks the
//! keyspace from the start.

/// Declares a backend's command table: the commands every backend shares,
/// followed by the backend's own entries.
macro_rules! command_table {
    ($name:ident, $backend:ty, [$($extra:expr),* $(,)?]) => {
        pub static $name: &[$crate::command::CommandHolder<$crate::connection::CdbConnection<$backend>>] = &[
            $crate::command::CommandHolder::new(
                "HELP",
                "[command]",
                "Return how to use command",
                $crate::command::version(0, 1, 0),
                "HELP GET",
                0,
                $crate::command::INFINITE_COMMAND_ARGS,
                $crate::command::handlers::help::<$backend>,
            ),
            $crate::command::CommandHolder::new(
                "INFO",
                "[section]",
                "Return information about the connection and the engine",
                $crate::command::version(0, 1, 0),
                "INFO",
                0,
                1,
                $crate::command::handlers::info::<$backend>,
            ),
            $crate::command::CommandHolder::new(
                "SCAN",
                "<cursor> [MATCH pattern] [COUNT count]",
                "Incrementally iterate the keys space",
                $crate::command::version(0, 1, 0),
                "SCAN 0 MATCH * COUNT 10",
                1,
                5,
                $crate::command::handlers::scan::<$backend>,
            ),
            $crate::command::CommandHolder::new(
                "DBKCOUNT",
                "-",
                "Return the number of keys in the selected database",
                $crate::command::version(0, 1, 0),
                "DBKCOUNT",
                0,
                0,
                $crate::command::handlers::dbkcount::<$backend>,
            ),
            $crate::command::CommandHolder::new(
                "SELECT",
                "<name>",
                "Change the selected database for the current connection",
                $crate::command::version(0, 1, 0),
                "SELECT default",
                1,
                1,
                $crate::command::handlers::select::<$backend>,
            ),
            $crate::command::CommandHolder::new(
                "SET",
                "<key> <value>",
                "Set the value of a key",
                $crate::command::version(0, 1, 0),
                "SET key value",
                2,
                2,
                $crate::command::handlers::set::<$backend>,
            ),
            $crate::command::CommandHolder::new(
                "GET",
                "<key>",
                "Get the value of a key",
                $crate::command::version(0, 1, 0),
                "GET key",
                1,
                1,
                $crate::command::handlers::get::<$backend>,
            ),
            $crate::command::CommandHolder::new(
                "DEL",
                "<key> [key ...]",
                "Delete key",
                $crate::command::version(0, 1, 0),
                "DEL key",
                1,
                $crate::command::INFINITE_COMMAND_ARGS,
                $crate::command::handlers::del::<$backend>,
            ),
            $crate::command::CommandHolder::new(
                "RENAME",
                "<key> <newkey>",
                "Rename a key",
                $crate::command::version(0, 1, 0),
                "RENAME old_name new_name",
                2,
                2,
                $crate::command::handlers::rename::<$backend>,
            ),
            $crate::command::CommandHolder::new(
                "FLUSHDB",
                "-",
                "Remove all keys from the current database",
                $crate::command::version(0, 1, 0),
                "FLUSHDB",
                0,
                0,
                $crate::command::handlers::flushdb::<$backend>,
            ),
            $crate::command::CommandHolder::new(
                "QUIT",
                "-",
                "Close the connection",
                $crate::command::version(0, 1, 0),
                "QUIT",
                0,
                0,
                $crate::command::handlers::quit::<$backend>,
            ),
            $($extra),*
        ];
    };
}

/// `KEYS` range query entry for ordered engines.
macro_rules! keys_command {
    ($backend:ty) => {
        $crate::command::CommandHolder::new(
            "KEYS",
            "<key_start> <key_end> <limit>",
            "Find all keys between key_start and key_end",
            $crate::command::version(0, 1, 0),
            "KEYS a z 10",
            3,
            3,
            $crate::command::handlers::keys::<$backend>,
        )
    };
}

/// `EXPIRE` entry for engines with key expiry.
macro_rules! expire_command {
    ($backend:ty) => {
        $crate::command::CommandHolder::new(
            "EXPIRE",
            "<key> <seconds>",
            "Set a key's time to live in seconds",
            $crate::command::version(0, 1, 0),
            "EXPIRE key 10",
            2,
            2,
            $crate::command::handlers::expire::<$backend>,
        )
    };
}

/// `TTL` entry for engines with key expiry.
macro_rules! ttl_command {
    ($backend:ty) => {
        $crate::command::CommandHolder::new(
            "TTL",
            "<key>",
            "Get the time to live for a key",
            $crate::command::version(0, 1, 0),
            "TTL key",
            1,
            1,
            $crate::command::handlers::ttl::<$backend>,
        )
    };
}

pub mod embedded_translator;
pub mod memory_store;
#[cfg(feature = "redb")]
pub mod redb_store;
#[cfg(feature = "redis")]
pub mod redis_store;
#[cfg(feature = "sled")]
pub mod sled_store;

use crate::config::BackendConfig;
use crate::connection::{CdbConnection, ConfigOf};
use crate::error::NosqlResult;
use crate::traits::{Backend, ConnectionClient, Session};

pub use embedded_translator::EmbeddedTranslator;
pub use memory_store::MemoryStore;
#[cfg(feature = "redb")]
pub use redb_store::RedbStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
#[cfg(feature = "sled")]
pub use sled_store::SledStore;

/// Connects backend `B` and erases its type.
pub fn connect_session<B: Backend>(
    config: ConfigOf<B>,
    client: Option<Box<dyn ConnectionClient>>,
) -> NosqlResult<Box<dyn Session>> {
    let mut connection = CdbConnection::<B>::new(client);
    connection.connect(config)?;
    Ok(Box::new(connection))
}

pub(crate) fn open_session(
    config: &BackendConfig,
    client: Option<Box<dyn ConnectionClient>>,
) -> NosqlResult<Box<dyn Session>> {
    match config {
        #[cfg(feature = "sled")]
        BackendConfig::Sled(cfg) => connect_session::<SledStore>(cfg.clone(), client),
        #[cfg(feature = "redb")]
        BackendConfig::Redb(cfg) => connect_session::<RedbStore>(cfg.clone(), client),
        #[cfg(feature = "redis")]
        BackendConfig::Redis(cfg) => connect_session::<RedisStore>(cfg.clone(), client),
        BackendConfig::Memory(cfg) => connect_session::<MemoryStore>(cfg.clone(), client),
    }
}
