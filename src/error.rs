//! Error types shared by every backend adapter.
//!
//! Every public verb in this crate returns `NosqlResult<T>`, an alias for
//! `Result<T, NosqlError>`. Errors are values, never panics, and each one
//! renders to a message that can be shown to the user as-is.
//!
//! Native engine errors (`sled::Error`, `redb::Error`, `redis::RedisError`)
//! are translated at the adapter boundary into one of the variants below, so
//! nothing above the adapters depends on an engine crate.
//!
//! # Example
//!
//! ```
//! use nosql_core::error::{ErrorKind, NosqlError};
//!
//! let err = NosqlError::not_supported("EXPIRE");
//! assert_eq!(err.kind(), ErrorKind::NotSupported);
//! assert_eq!(err.to_string(), "Not supported command: EXPIRE.");
//! ```

use strum::{Display, EnumIter};
use thiserror::Error;

/// Result type alias for all connection operations.
pub type NosqlResult<T> = Result<T, NosqlError>;

/// Cluster redirection flavour carried by [`NosqlError::Redirect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RedirectKind {
    Moved,
    Ask,
}

/// The common error type.
#[derive(Error, Debug)]
pub enum NosqlError {
    /// A required parameter was empty or malformed; no native call was made.
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Not connected")]
    NotConnected,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Already connected")]
    AlreadyConnected,

    /// Native connect/open failure, message includes the engine's text.
    #[error("{0}")]
    ConnectionFailed(String),

    /// A native call failed on an established connection.
    #[error("{command} function error: {message}")]
    OperationFailed { command: String, message: String },

    /// The key (or database) does not exist.
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    NotSupported(String),

    /// A listen loop observed the interruption flag.
    #[error("Interrupted")]
    Interrupted,

    /// The connection is unusable and must be rebuilt by the caller.
    #[error("Needed reconnect.")]
    NeedsReconnect,

    /// Cluster redirection (`MOVED`/`ASK`) with its target node.
    #[error("{message}")]
    Redirect {
        message: String,
        kind: RedirectKind,
        slot: u16,
        host: String,
        port: u16,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`NosqlError`] for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ErrorKind {
    InvalidArgument,
    NotConnected,
    NotAuthenticated,
    AlreadyConnected,
    ConnectionFailed,
    OperationFailed,
    NotFound,
    NotSupported,
    Interrupted,
    NeedsReconnect,
    Redirect,
    Configuration,
    Io,
}

impl NosqlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NosqlError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            NosqlError::NotConnected => ErrorKind::NotConnected,
            NosqlError::NotAuthenticated => ErrorKind::NotAuthenticated,
            NosqlError::AlreadyConnected => ErrorKind::AlreadyConnected,
            NosqlError::ConnectionFailed(_) => ErrorKind::ConnectionFailed,
            NosqlError::OperationFailed { .. } => ErrorKind::OperationFailed,
            NosqlError::NotFound(_) => ErrorKind::NotFound,
            NosqlError::NotSupported(_) => ErrorKind::NotSupported,
            NosqlError::Interrupted => ErrorKind::Interrupted,
            NosqlError::NeedsReconnect => ErrorKind::NeedsReconnect,
            NosqlError::Redirect { .. } => ErrorKind::Redirect,
            NosqlError::Configuration(_) => ErrorKind::Configuration,
            NosqlError::Io(_) => ErrorKind::Io,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, NosqlError::NotFound(_))
    }

    /// Generic "bad parameters" error, used before any native call.
    pub fn invalid_input() -> Self {
        NosqlError::InvalidArgument("Invalid input argument(s)".to_string())
    }

    /// Arity or value validation failure for a named command.
    pub fn invalid_input_arguments(command: &str) -> Self {
        NosqlError::InvalidArgument(format!("Invalid input argument(s) for command: {command}."))
    }

    pub fn not_supported(command: &str) -> Self {
        NosqlError::NotSupported(format!("Not supported command: {command}."))
    }

    /// An argument sequence that matches no command in the table.
    pub fn unknown_sequence<A: AsRef<[u8]>>(argv: &[A]) -> Self {
        let joined = argv
            .iter()
            .map(|arg| String::from_utf8_lossy(arg.as_ref()).into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        NosqlError::InvalidArgument(format!("Unknown sequence: '{joined}'."))
    }

    pub fn key_not_found(key: &str) -> Self {
        NosqlError::NotFound(format!("key not found: {key}"))
    }

    pub fn operation_failed(command: &str, message: impl ToString) -> Self {
        NosqlError::OperationFailed {
            command: command.to_string(),
            message: message.to_string(),
        }
    }

    /// Open/connect failure of an embedded engine.
    pub fn open_failed(message: impl std::fmt::Display) -> Self {
        NosqlError::ConnectionFailed(format!("Fail open database: {message}"))
    }

    /// Connect failure of a networked engine.
    pub fn connect_failed(message: impl std::fmt::Display) -> Self {
        NosqlError::ConnectionFailed(format!("Fail connect to server: {message}"))
    }
}

impl From<toml::de::Error> for NosqlError {
    fn from(err: toml::de::Error) -> Self {
        NosqlError::Configuration(err.to_string())
    }
}

impl From<toml::ser::Error> for NosqlError {
    fn from(err: toml::ser::Error) -> Self {
        NosqlError::Configuration(err.to_string())
    }
}
