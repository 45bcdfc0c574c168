//! # nosql_core
//!
//! One connection and command layer over several key-value engines.
//!
//! A connection to any backend offers the same verbs (`get`, `set`,
//! `delete`, `rename`, `scan`, `keys`, `select`, TTL handling, ...), the
//! same command-line surface (`execute("SET key value")`, `help`) and the
//! same change notifications, while each engine keeps its own native
//! primitives underneath.
//!
//! ## Backends
//!
//! - **sled** (feature `sled`): named databases are sled trees
//! - **redb** (feature `redb`): one database file, one table
//! - **redis** (feature `redis`): a Redis server, numbered databases, TTL,
//!   pub/sub and `MONITOR`
//! - **memory**: an in-process ordered map with key expiry
//!
//! ## Quick Start
//!
//! ```rust
//! use nosql_core::prelude::*;
//!
//! let mut conn = CdbConnection::<MemoryStore>::new(None);
//! conn.connect(MemoryConfig::default())?;
//!
//! conn.set(&NDbKValue::new(NKey::new("user:1"), Value::from("alice")))?;
//! assert_eq!(conn.get(&NKey::new("user:1"))?.value_string(), "alice");
//!
//! let out = conn.execute(b"SET user:2 bob\nDBKCOUNT")?;
//! assert_eq!(out.children().len(), 2);
//! # Ok::<(), nosql_core::error::NosqlError>(())
//! ```
//!
//! ## Backend-erased connections
//!
//! [`config::ConnectionSettings`] describes a connection in TOML and opens
//! it as a `Box<dyn Session>`, so callers can hold connections to different
//! engines side by side:
//!
//! ```rust
//! use nosql_core::config::SettingsFile;
//!
//! let settings = SettingsFile::from_toml_str(r#"
//!     [[connection]]
//!     name = "cache"
//!     type = "memory"
//!     max_entries = 100
//! "#)?;
//! let mut session = settings.get("cache")?.open(None)?;
//! assert_eq!(session.db_kcount()?, 0);
//! # Ok::<(), nosql_core::error::NosqlError>(())
//! ```

pub mod command;
pub mod config;
pub mod connection;
pub mod databases;
pub mod error;
pub mod pattern;
pub mod prelude;
pub mod traits;
pub mod types;

pub use error::{NosqlError, NosqlResult};
