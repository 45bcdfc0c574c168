//! Handlers for the commands every backend understands.
//!
//! Each handler parses the arguments that follow the command name, calls
//! the matching [`CdbConnection`] verb and appends one child to the output
//! tree. Arity was already checked against the table entry, so handlers
//! index `argv` directly up to the table's `min_args`.

use crate::command::args::{arg_str, parse_arg};
use crate::command::output::FastoObject;
use crate::connection::CdbConnection;
use crate::error::{NosqlError, NosqlResult};
use crate::traits::Backend;
use crate::types::{ALL_KEYS_PATTERN, Cursor, KeyString, NDbKValue, NKey, Ttl, Value};

const OK_REPLY: &str = "OK";

pub fn help<B: Backend>(conn: &mut CdbConnection<B>, argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    let text = conn.help(argv)?;
    out.add_value(Value::from(text));
    Ok(())
}

pub fn info<B: Backend>(conn: &mut CdbConnection<B>, argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    let section = argv.first().map(|arg| arg_str(arg));
    let info = conn.info(section.as_deref())?;
    out.add_value(info);
    Ok(())
}

/// `SCAN <cursor> [MATCH pattern] [COUNT count]`
pub fn scan<B: Backend>(conn: &mut CdbConnection<B>, argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    let cursor: Cursor = parse_arg(&argv[0], "SCAN")?;
    let mut pattern = ALL_KEYS_PATTERN.to_string();
    let mut count = B::DEFAULT_SCAN_COUNT;

    for option in argv[1..].chunks(2) {
        let [name, value] = option else {
            return Err(NosqlError::invalid_input_arguments("SCAN"));
        };
        if name.eq_ignore_ascii_case(b"MATCH") {
            pattern = arg_str(value);
        } else if name.eq_ignore_ascii_case(b"COUNT") {
            count = parse_arg(value, "SCAN")?;
        } else {
            return Err(NosqlError::invalid_input_arguments("SCAN"));
        }
    }

    let page = conn.scan(cursor, &pattern, count)?;
    let keys = page.keys.iter().map(|key| Value::string(key.as_bytes())).collect();
    out.add_value(Value::Array(vec![
        Value::from(page.cursor.to_string()),
        Value::Array(keys),
    ]));
    Ok(())
}

/// `KEYS <key_start> <key_end> <limit>`
pub fn keys<B: Backend>(conn: &mut CdbConnection<B>, argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    let start = KeyString::from(argv[0].as_slice());
    let end = KeyString::from(argv[1].as_slice());
    let limit: u64 = parse_arg(&argv[2], "KEYS")?;
    let keys = conn.keys(&start, &end, limit)?;
    out.add_value(Value::Array(
        keys.iter().map(|key| Value::string(key.as_bytes())).collect(),
    ));
    Ok(())
}

pub fn dbkcount<B: Backend>(conn: &mut CdbConnection<B>, _argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    let count = conn.db_kcount()?;
    out.add_value(Value::from(count_value(count)));
    Ok(())
}

pub fn select<B: Backend>(conn: &mut CdbConnection<B>, argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    conn.select(&arg_str(&argv[0]))?;
    out.add_value(Value::from(OK_REPLY));
    Ok(())
}

pub fn create_db<B: Backend>(conn: &mut CdbConnection<B>, argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    conn.create_database(&arg_str(&argv[0]))?;
    out.add_value(Value::from(OK_REPLY));
    Ok(())
}

pub fn remove_db<B: Backend>(conn: &mut CdbConnection<B>, argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    conn.remove_database(&arg_str(&argv[0]))?;
    out.add_value(Value::from(OK_REPLY));
    Ok(())
}

pub fn set<B: Backend>(conn: &mut CdbConnection<B>, argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    let record = NDbKValue::new(NKey::new(argv[0].as_slice()), Value::string(argv[1].as_slice()));
    conn.set(&record)?;
    out.add_value(Value::from(OK_REPLY));
    Ok(())
}

pub fn get<B: Backend>(conn: &mut CdbConnection<B>, argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    let loaded = conn.get(&NKey::new(argv[0].as_slice()))?;
    out.add_value(loaded.value().clone());
    Ok(())
}

pub fn del<B: Backend>(conn: &mut CdbConnection<B>, argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    let keys: Vec<NKey> = argv.iter().map(|arg| NKey::new(arg.as_slice())).collect();
    let deleted = conn.delete(&keys)?;
    out.add_value(Value::from(count_value(deleted.len())));
    Ok(())
}

pub fn rename<B: Backend>(conn: &mut CdbConnection<B>, argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    let key = NKey::new(argv[0].as_slice());
    conn.rename(&key, &KeyString::from(argv[1].as_slice()))?;
    out.add_value(Value::from(OK_REPLY));
    Ok(())
}

pub fn flushdb<B: Backend>(conn: &mut CdbConnection<B>, _argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    conn.flush_db()?;
    out.add_value(Value::from(OK_REPLY));
    Ok(())
}

/// `EXPIRE <key> <ttl>`
pub fn expire<B: Backend>(conn: &mut CdbConnection<B>, argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    let ttl: Ttl = parse_arg(&argv[1], "EXPIRE")?;
    conn.set_ttl(&NKey::new(argv[0].as_slice()), ttl)?;
    out.add_value(Value::from(OK_REPLY));
    Ok(())
}

pub fn ttl<B: Backend>(conn: &mut CdbConnection<B>, argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    let ttl = conn.get_ttl(&NKey::new(argv[0].as_slice()))?;
    out.add_value(Value::from(ttl));
    Ok(())
}

pub fn quit<B: Backend>(conn: &mut CdbConnection<B>, _argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    conn.quit()?;
    out.add_value(Value::from(OK_REPLY));
    Ok(())
}

pub(crate) fn count_value(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
