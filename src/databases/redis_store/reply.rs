//! Conversion of `redis` replies and errors into crate types.

use redis::RedisError;

use crate::error::{NosqlError, RedirectKind};
use crate::types::{Cursor, KeyString, ScanPage, Value, ValueType};

/// Maps a redis error for `command` onto the common error type.
///
/// Dropped connections ask the caller to reconnect; cluster redirections
/// keep their target node.
pub(crate) fn map_error(command: &str, err: RedisError) -> NosqlError {
    if err.is_connection_dropped() {
        return NosqlError::NeedsReconnect;
    }
    let redirect = match err.code() {
        Some("MOVED") => Some(RedirectKind::Moved),
        Some("ASK") => Some(RedirectKind::Ask),
        _ => None,
    };
    if let (Some(kind), Some(detail)) = (redirect, err.detail()) {
        if let Some(redirect) = parse_redirect(kind, detail) {
            return redirect;
        }
    }
    if err.detail().is_some_and(|detail| detail.contains("no such key")) {
        return NosqlError::NotFound(err.to_string());
    }
    NosqlError::operation_failed(command, err)
}

/// Parses the `<slot> <host>:<port>` payload of a `MOVED`/`ASK` reply.
pub(crate) fn parse_redirect(kind: RedirectKind, detail: &str) -> Option<NosqlError> {
    let (slot, node) = detail.trim().split_once(' ')?;
    let slot: u16 = slot.parse().ok()?;
    let (host, port) = node.rsplit_once(':')?;
    let port: u16 = port.parse().ok()?;
    Some(NosqlError::Redirect {
        message: format!("-> Redirected to slot [{slot}] located at {host}:{port}"),
        kind,
        slot,
        host: host.to_string(),
        port,
    })
}

fn bytes_of(reply: &redis::Value) -> Option<Vec<u8>> {
    match reply {
        redis::Value::BulkString(bytes) => Some(bytes.clone()),
        redis::Value::SimpleString(text) => Some(text.as_bytes().to_vec()),
        redis::Value::Okay => Some(b"OK".to_vec()),
        redis::Value::Int(value) => Some(value.to_string().into_bytes()),
        redis::Value::Double(value) => Some(value.to_string().into_bytes()),
        _ => None,
    }
}

fn items_of(reply: redis::Value) -> Vec<redis::Value> {
    match reply {
        redis::Value::Array(items) | redis::Value::Set(items) => items,
        redis::Value::Map(pairs) => pairs.into_iter().flat_map(|(k, v)| [k, v]).collect(),
        redis::Value::Nil => Vec::new(),
        other => vec![other],
    }
}

fn byte_items(reply: redis::Value) -> Vec<Vec<u8>> {
    items_of(reply).iter().filter_map(bytes_of).collect()
}

fn byte_pairs(reply: redis::Value) -> Vec<(Vec<u8>, Vec<u8>)> {
    byte_items(reply)
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}

/// Generic conversion, used for replies shown as-is.
pub(crate) fn to_value(reply: redis::Value) -> Value {
    match reply {
        redis::Value::Nil => Value::Null,
        redis::Value::Int(value) => Value::Integer(value),
        redis::Value::Boolean(flag) => Value::Integer(i64::from(flag)),
        redis::Value::Array(items) => Value::Array(items.into_iter().map(to_value).collect()),
        redis::Value::Set(items) => Value::Set(items.iter().filter_map(bytes_of).collect()),
        redis::Value::Map(pairs) => Value::Hash(byte_pairs(redis::Value::Map(pairs))),
        other => match bytes_of(&other) {
            Some(bytes) => Value::String(bytes),
            None => Value::String(format!("{other:?}").into_bytes()),
        },
    }
}

/// Converts the reply of a typed load into a value of `value_type`.
pub(crate) fn typed_value(value_type: ValueType, reply: redis::Value) -> Value {
    match value_type {
        ValueType::Null => Value::Null,
        ValueType::String | ValueType::Integer => match bytes_of(&reply) {
            Some(bytes) => Value::String(bytes),
            None => to_value(reply),
        },
        ValueType::Array => Value::Array(byte_items(reply).into_iter().map(Value::String).collect()),
        ValueType::Set => Value::Set(byte_items(reply)),
        ValueType::ZSet => Value::ZSet(
            byte_pairs(reply)
                .into_iter()
                .map(|(member, score)| {
                    let score = String::from_utf8_lossy(&score).parse().unwrap_or(0.0);
                    (member, score)
                })
                .collect(),
        ),
        ValueType::Hash => Value::Hash(byte_pairs(reply)),
    }
}

/// Value type named by a `TYPE` reply; `None` for `none`. Types without a
/// [`Value`] form (streams, modules) are not supported.
pub(crate) fn value_type_of(reply: &redis::Value) -> Result<Option<ValueType>, NosqlError> {
    let name = bytes_of(reply).unwrap_or_default();
    match name.as_slice() {
        b"none" => Ok(None),
        b"string" => Ok(Some(ValueType::String)),
        b"list" => Ok(Some(ValueType::Array)),
        b"set" => Ok(Some(ValueType::Set)),
        b"zset" => Ok(Some(ValueType::ZSet)),
        b"hash" => Ok(Some(ValueType::Hash)),
        other => Err(NosqlError::NotSupported(format!(
            "Not supported value type: {}.",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// Splits a `SCAN` reply into the next cursor and the page of keys.
pub(crate) fn scan_page(reply: redis::Value) -> Result<ScanPage, NosqlError> {
    let unexpected = |reply: &dyn std::fmt::Debug| {
        NosqlError::operation_failed("SCAN", format!("unexpected reply {reply:?}"))
    };
    let mut parts = match reply {
        redis::Value::Array(parts) => parts,
        other => return Err(unexpected(&other)),
    };
    if parts.len() != 2 {
        return Err(unexpected(&parts));
    }
    let keys = parts.pop().map(byte_items).unwrap_or_default();
    let cursor = parts
        .pop()
        .as_ref()
        .and_then(bytes_of)
        .and_then(|bytes| String::from_utf8_lossy(&bytes).parse::<Cursor>().ok())
        .ok_or_else(|| unexpected(&parts))?;
    Ok(ScanPage {
        keys: keys.into_iter().map(KeyString::from).collect(),
        cursor,
    })
}

/// Reads an integer reply.
pub(crate) fn integer_of(command: &str, reply: &redis::Value) -> Result<i64, NosqlError> {
    match reply {
        redis::Value::Int(value) => Ok(*value),
        other => bytes_of(other)
            .and_then(|bytes| String::from_utf8_lossy(&bytes).parse().ok())
            .ok_or_else(|| NosqlError::operation_failed(command, format!("unexpected reply {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn bulk(text: &str) -> redis::Value {
        redis::Value::BulkString(text.as_bytes().to_vec())
    }

    #[test]
    fn parses_moved_and_ask() {
        let err = parse_redirect(RedirectKind::Moved, "3999 127.0.0.1:6381").unwrap();
        assert_matches!(
            &err,
            NosqlError::Redirect { kind: RedirectKind::Moved, slot: 3999, host, port: 6381, .. } if host == "127.0.0.1"
        );
        assert_eq!(err.to_string(), "-> Redirected to slot [3999] located at 127.0.0.1:6381");

        let err = parse_redirect(RedirectKind::Ask, "12 ::1:7000").unwrap();
        assert_matches!(err, NosqlError::Redirect { host, port: 7000, .. } if host == "::1");
        assert!(parse_redirect(RedirectKind::Moved, "garbage").is_none());
    }

    #[test]
    fn typed_replies() {
        let pairs = redis::Value::Array(vec![bulk("a"), bulk("1.5"), bulk("b"), bulk("2")]);
        assert_eq!(
            typed_value(ValueType::ZSet, pairs),
            Value::ZSet(vec![(b"a".to_vec(), 1.5), (b"b".to_vec(), 2.0)])
        );
        let hash = redis::Value::Map(vec![(bulk("f"), bulk("v"))]);
        assert_eq!(typed_value(ValueType::Hash, hash), Value::Hash(vec![(b"f".to_vec(), b"v".to_vec())]));
        let list = redis::Value::Array(vec![bulk("x"), bulk("y")]);
        assert_eq!(
            typed_value(ValueType::Array, list),
            Value::Array(vec![Value::from("x"), Value::from("y")])
        );
    }

    #[test]
    fn type_names() {
        assert_eq!(value_type_of(&redis::Value::SimpleString("list".into())).unwrap(), Some(ValueType::Array));
        assert_eq!(value_type_of(&redis::Value::SimpleString("none".into())).unwrap(), None);
        assert_matches!(value_type_of(&redis::Value::SimpleString("stream".into())), Err(NosqlError::NotSupported(_)));
    }

    #[test]
    fn scan_replies() {
        let reply = redis::Value::Array(vec![bulk("17"), redis::Value::Array(vec![bulk("a"), bulk("b")])]);
        let page = scan_page(reply).unwrap();
        assert_eq!(page.cursor, 17);
        assert_eq!(page.keys, vec![KeyString::from("a"), KeyString::from("b")]);
        assert_matches!(scan_page(redis::Value::Nil), Err(NosqlError::OperationFailed { .. }));
    }

    #[test]
    fn generic_replies() {
        assert_eq!(to_value(redis::Value::Okay), Value::from("OK"));
        assert_eq!(to_value(redis::Value::Nil), Value::Null);
        assert_eq!(integer_of("DBSIZE", &redis::Value::Int(3)).unwrap(), 3);
        assert_matches!(integer_of("DBSIZE", &redis::Value::Nil), Err(NosqlError::OperationFailed { .. }));
    }
}
