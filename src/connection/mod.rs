//! Generic connection layer shared by every backend.

pub mod cdb_connection;
pub mod db_connection;
pub mod paging;

pub use cdb_connection::{CdbConnection, ConfigOf};
pub use db_connection::DbConnection;
pub use paging::{offset_scan, range_keys};
