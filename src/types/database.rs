//! Logical database descriptors and scan paging.

use crate::types::key::KeyString;

/// Name of the only database of single-database engines.
pub const DEFAULT_DB_NAME: &str = "default";

/// Pattern matching every key.
pub const ALL_KEYS_PATTERN: &str = "*";

/// Page size meaning "no limit".
pub const NO_KEYS_LIMIT: u64 = u64::MAX;

/// Opaque iteration position; `0` both starts and ends an iteration.
pub type Cursor = u64;

/// Descriptor of one logical database (named tree, numbered DB, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataBaseInfo {
    name: String,
    is_current: bool,
    keys_count: usize,
}

impl DataBaseInfo {
    pub fn new(name: impl Into<String>, is_current: bool, keys_count: usize) -> Self {
        DataBaseInfo {
            name: name.into(),
            is_current,
            keys_count,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_current(&self) -> bool {
        self.is_current
    }

    pub fn keys_count(&self) -> usize {
        self.keys_count
    }
}

/// One page of a `Scan`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    pub keys: Vec<KeyString>,
    pub cursor: Cursor,
}

impl ScanPage {
    pub fn is_last(&self) -> bool {
        self.cursor == 0
    }
}
