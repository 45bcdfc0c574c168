//! Handlers for the Redis-only table entries.

use crate::command::args::arg_str;
use crate::command::handlers::count_value;
use crate::command::output::FastoObject;
use crate::connection::CdbConnection;
use crate::databases::RedisStore;
use crate::error::{NosqlError, NosqlResult};
use crate::types::Value;

pub fn dbsize(conn: &mut CdbConnection<RedisStore>, _argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    let count = conn.db_kcount()?;
    out.add_value(Value::from(count_value(count)));
    Ok(())
}

/// `PUBLISH <channel> <message>`, answers the receiver count.
pub fn publish(conn: &mut CdbConnection<RedisStore>, argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    let receivers = conn.backend_mut().publish(&arg_str(&argv[0]), &argv[1])?;
    out.add_value(Value::from(receivers));
    Ok(())
}

/// Collects messages into `out` until the connection is interrupted.
pub fn subscribe(conn: &mut CdbConnection<RedisStore>, argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    let channels: Vec<String> = argv.iter().map(|arg| arg_str(arg)).collect();
    let result = conn.backend_mut().subscribe(&channels, |message| {
        out.add_value(message);
    });
    until_interrupted(result)
}

pub fn monitor(conn: &mut CdbConnection<RedisStore>, _argv: &[Vec<u8>], out: &mut FastoObject) -> NosqlResult<()> {
    let result = conn.backend_mut().monitor(|line| {
        out.add_value(line);
    });
    until_interrupted(result)
}

/// An interrupted listen loop is the normal end of a command.
fn until_interrupted(result: NosqlResult<()>) -> NosqlResult<()> {
    match result {
        Err(NosqlError::Interrupted) => Ok(()),
        other => other,
    }
}
