//! Data model shared by every backend: keys, values, records and
//! database descriptors.

pub mod database;
pub mod key;
pub mod value;

pub use database::{
    ALL_KEYS_PATTERN, Cursor, DEFAULT_DB_NAME, DataBaseInfo, NO_KEYS_LIMIT, ScanPage,
};
pub use key::{EXPIRED_TTL, KeyString, NKey, NKeys, NO_TTL, Ttl};
pub use value::{NDbKValue, NValue, Value, ValueType};
