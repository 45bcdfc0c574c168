//! Keys and TTLs.

use std::fmt;

use derive_more::{Deref, From, Into};

use crate::command::args::quote_for_command_line;

/// Time to live in seconds.
pub type Ttl = i64;

/// The key exists and never expires.
pub const NO_TTL: Ttl = -1;

/// The key does not exist or has already expired.
pub const EXPIRED_TTL: Ttl = -2;

/// Binary-safe key bytes.
///
/// Ordering is plain byte order, which is the order every offset-cursor
/// engine in this crate iterates in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, From, Into, Deref)]
pub struct KeyString(Vec<u8>);

impl KeyString {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        KeyString(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }

    /// Renders the key as a single command-line argument, quoting and
    /// escaping it when it is not plain printable text.
    pub fn for_command_line(&self) -> Vec<u8> {
        quote_for_command_line(&self.0)
    }
}

impl From<&str> for KeyString {
    fn from(value: &str) -> Self {
        KeyString(value.as_bytes().to_vec())
    }
}

impl From<String> for KeyString {
    fn from(value: String) -> Self {
        KeyString(value.into_bytes())
    }
}

impl From<&[u8]> for KeyString {
    fn from(value: &[u8]) -> Self {
        KeyString(value.to_vec())
    }
}

impl AsRef<[u8]> for KeyString {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for KeyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// A key together with its (optional) time to live.
///
/// Two `NKey`s are `==` only when both key and TTL match; use
/// [`NKey::equals_key`] for identity lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NKey {
    key: KeyString,
    ttl: Ttl,
}

pub type NKeys = Vec<NKey>;

impl NKey {
    pub fn new(key: impl Into<KeyString>) -> Self {
        NKey {
            key: key.into(),
            ttl: NO_TTL,
        }
    }

    pub fn with_ttl(key: impl Into<KeyString>, ttl: Ttl) -> Self {
        NKey {
            key: key.into(),
            ttl,
        }
    }

    pub fn key(&self) -> &KeyString {
        &self.key
    }

    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    pub fn set_ttl(&mut self, ttl: Ttl) {
        self.ttl = ttl;
    }

    pub fn equals_key(&self, other: &NKey) -> bool {
        self.key == other.key
    }
}

impl From<&str> for NKey {
    fn from(value: &str) -> Self {
        NKey::new(value)
    }
}

impl From<KeyString> for NKey {
    fn from(value: KeyString) -> Self {
        NKey::new(value)
    }
}

impl fmt::Display for NKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key.fmt(f)
    }
}
