//! Connection configuration for every backend.
//!
//! Each backend has one config value object. They are built in code with
//! `typed-builder` or read from TOML with serde; both paths share the same
//! defaults. A config is immutable once a connection was opened with it.
//!
//! # Examples
//!
//! ```
//! use nosql_core::config::{BackendConfig, MemoryConfig, SettingsFile};
//!
//! let config = MemoryConfig::builder().max_entries(Some(10)).build();
//! assert_eq!(config.initial_capacity, 1000);
//!
//! let file = SettingsFile::from_toml_str(
//!     r#"
//!     [[connection]]
//!     name = "cache"
//!     type = "memory"
//!     max_entries = 100
//!     "#,
//! )
//! .unwrap();
//! let cache = file.find("cache").unwrap();
//! assert!(matches!(cache.config, BackendConfig::Memory(ref m) if m.max_entries == Some(100)));
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use typed_builder::TypedBuilder;

use crate::error::{NosqlError, NosqlResult};
use crate::traits::{ConnectionClient, Session};

/// The backends this crate can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Sled,
    Redb,
    Redis,
    Memory,
}

fn default_true() -> bool {
    true
}

fn default_cache_mb() -> usize {
    64
}

/// Sled database; named trees act as named databases.
///
/// ```
/// use nosql_core::config::SledConfig;
///
/// let config = SledConfig::builder().db_path("/tmp/sled-data").build();
/// assert!(config.create_if_missing);
/// assert_eq!(config.cache_capacity_mb, 64);
/// ```
#[derive(Debug, Clone, PartialEq, TypedBuilder, Serialize, Deserialize)]
#[builder(doc)]
pub struct SledConfig {
    /// Database directory
    #[builder(setter(into))]
    pub db_path: PathBuf,

    /// Create the directory when it doesn't exist
    #[builder(default = true)]
    #[serde(default = "default_true")]
    pub create_if_missing: bool,

    /// Page cache size in megabytes
    #[builder(default = 64)]
    #[serde(default = "default_cache_mb")]
    pub cache_capacity_mb: usize,

    /// Throw-away database; `db_path` is not validated
    #[builder(default = false)]
    #[serde(default)]
    pub temporary: bool,
}

impl SledConfig {
    /// Temporary in-memory database for tests.
    pub fn temporary() -> Self {
        SledConfig::builder()
            .db_path(std::env::temp_dir())
            .temporary(true)
            .build()
    }
}

/// Redb database file holding a single table.
#[derive(Debug, Clone, PartialEq, TypedBuilder, Serialize, Deserialize)]
#[builder(doc)]
pub struct RedbConfig {
    /// Database file
    #[builder(setter(into))]
    pub db_path: PathBuf,

    /// Create the file when it doesn't exist
    #[builder(default = true)]
    #[serde(default = "default_true")]
    pub create_if_missing: bool,

    /// Cache size in megabytes
    #[builder(default = 64)]
    #[serde(default = "default_cache_mb")]
    pub cache_size_mb: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

/// Redis server address and credentials.
///
/// ```
/// use nosql_core::config::RedisConfig;
///
/// let config = RedisConfig::builder().db_num(2).build();
/// assert_eq!(config.host, "127.0.0.1");
/// assert_eq!(config.port, 6379);
/// ```
#[derive(Debug, Clone, PartialEq, TypedBuilder, Serialize, Deserialize)]
#[builder(doc)]
pub struct RedisConfig {
    #[builder(default = default_host(), setter(into))]
    #[serde(default = "default_host")]
    pub host: String,

    #[builder(default = 6379)]
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database selected right after connecting
    #[builder(default = 0)]
    #[serde(default)]
    pub db_num: i64,

    /// ACL user name, sent with `password`
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// `AUTH` password
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[builder(default = 5000)]
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        RedisConfig::builder().build()
    }
}

fn default_initial_capacity() -> usize {
    1000
}

/// In-process store with TTL support.
#[derive(Debug, Clone, PartialEq, TypedBuilder, Serialize, Deserialize)]
#[builder(doc)]
pub struct MemoryConfig {
    /// Accepted so settings files written for hashed stores still load.
    /// The ordered map behind this backend has no capacity to reserve, so
    /// the value is ignored.
    #[builder(default = 1000)]
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,

    /// Maximum number of keys; inserting past it fails
    #[builder(default = None)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        MemoryConfig::builder().build()
    }
}

/// Backend-tagged config, as stored in a settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    #[cfg(feature = "sled")]
    Sled(SledConfig),
    #[cfg(feature = "redb")]
    Redb(RedbConfig),
    #[cfg(feature = "redis")]
    Redis(RedisConfig),
    Memory(MemoryConfig),
}

impl BackendConfig {
    pub fn connection_type(&self) -> ConnectionType {
        match self {
            #[cfg(feature = "sled")]
            BackendConfig::Sled(_) => ConnectionType::Sled,
            #[cfg(feature = "redb")]
            BackendConfig::Redb(_) => ConnectionType::Redb,
            #[cfg(feature = "redis")]
            BackendConfig::Redis(_) => ConnectionType::Redis,
            BackendConfig::Memory(_) => ConnectionType::Memory,
        }
    }
}

/// One named connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    pub name: String,
    #[serde(flatten)]
    pub config: BackendConfig,
}

impl ConnectionSettings {
    pub fn new(name: impl Into<String>, config: BackendConfig) -> Self {
        ConnectionSettings {
            name: name.into(),
            config,
        }
    }

    pub fn connection_type(&self) -> ConnectionType {
        self.config.connection_type()
    }

    /// Builds the matching backend and connects it.
    pub fn open(&self, client: Option<Box<dyn ConnectionClient>>) -> NosqlResult<Box<dyn Session>> {
        crate::databases::open_session(&self.config, client)
    }
}

/// A list of `[[connection]]` tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default, rename = "connection")]
    pub connections: Vec<ConnectionSettings>,
}

impl SettingsFile {
    pub fn from_toml_str(input: &str) -> NosqlResult<Self> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: impl AsRef<Path>) -> NosqlResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> NosqlResult<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn find(&self, name: &str) -> Option<&ConnectionSettings> {
        self.connections.iter().find(|c| c.name == name)
    }

    /// Like [`find`](Self::find), but a missing name is an error.
    pub fn get(&self, name: &str) -> NosqlResult<&ConnectionSettings> {
        self.find(name)
            .ok_or_else(|| NosqlError::Configuration(format!("unknown connection: {name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[cfg(feature = "redis")]
    #[test]
    fn serde_defaults_match_builder_defaults() {
        let file = SettingsFile::from_toml_str(
            r#"
            [[connection]]
            name = "local"
            type = "redis"

            [[connection]]
            name = "mem"
            type = "memory"
            "#,
        )
        .unwrap();

        let local = file.get("local").unwrap();
        assert_eq!(local.connection_type(), ConnectionType::Redis);
        assert_matches!(&local.config, BackendConfig::Redis(cfg) if *cfg == RedisConfig::default());

        let mem = file.get("mem").unwrap();
        assert_matches!(&mem.config, BackendConfig::Memory(cfg) if *cfg == MemoryConfig::default());
    }

    #[cfg(feature = "sled")]
    #[test]
    fn embedded_paths_are_required() {
        let err = SettingsFile::from_toml_str(
            r#"
            [[connection]]
            name = "disk"
            type = "sled"
            "#,
        )
        .unwrap_err();
        assert_matches!(err, NosqlError::Configuration(_));
    }

    #[cfg(feature = "redb")]
    #[test]
    fn round_trips_through_toml() {
        let file = SettingsFile {
            connections: vec![
                ConnectionSettings::new(
                    "disk",
                    BackendConfig::Redb(RedbConfig::builder().db_path("/tmp/data.redb").build()),
                ),
                ConnectionSettings::new("mem", BackendConfig::Memory(MemoryConfig::default())),
            ],
        };
        let text = file.to_toml_string().unwrap();
        assert_eq!(SettingsFile::from_toml_str(&text).unwrap(), file);
    }

    #[test]
    fn unknown_names_and_types_are_configuration_errors() {
        let file = SettingsFile::default();
        assert_matches!(file.get("nope"), Err(NosqlError::Configuration(_)));
        assert_matches!(
            SettingsFile::from_toml_str("[[connection]]\nname = \"x\"\ntype = \"lmdb\"\n"),
            Err(NosqlError::Configuration(_))
        );
        assert_eq!("redb".parse::<ConnectionType>().unwrap(), ConnectionType::Redb);
    }
}
