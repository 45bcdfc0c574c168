//! Prelude module for convenient imports.
//!
//! ```rust
//! use nosql_core::prelude::*;
//! ```
//!
//! # What's Included
//!
//! - [`CdbConnection`] and the [`Session`] trait object it implements
//! - the always-available [`MemoryStore`], plus [`SledStore`], [`RedbStore`]
//!   and [`RedisStore`] when their features are on
//! - config structs and [`ConnectionSettings`]
//! - keys, values and database descriptors
//! - [`NosqlError`] and [`NosqlResult`]
//!
//! The extension traits ([`Backend`], [`CommandTranslator`],
//! [`ConnectionClient`]) are included because calling their provided
//! methods needs them in scope.

pub use crate::config::{BackendConfig, ConnectionSettings, ConnectionType, MemoryConfig, SettingsFile};
#[cfg(feature = "redb")]
pub use crate::config::RedbConfig;
#[cfg(feature = "redis")]
pub use crate::config::RedisConfig;
#[cfg(feature = "sled")]
pub use crate::config::SledConfig;

pub use crate::connection::CdbConnection;
pub use crate::databases::MemoryStore;
#[cfg(feature = "redb")]
pub use crate::databases::RedbStore;
#[cfg(feature = "redis")]
pub use crate::databases::RedisStore;
#[cfg(feature = "sled")]
pub use crate::databases::SledStore;

pub use crate::command::FastoObject;
pub use crate::error::{ErrorKind, NosqlError, NosqlResult};
pub use crate::traits::{Backend, CommandTranslator, ConnectionClient, Session};
pub use crate::types::{
    ALL_KEYS_PATTERN, Cursor, DataBaseInfo, KeyString, NDbKValue, NKey, NKeys, NO_TTL, ScanPage,
    Ttl, Value, ValueType,
};
