//! Redis command rendering.
//!
//! Every line produced here is valid `redis-cli` input. The adapter sends
//! these same lines to the server, split back into arguments, so the text a
//! user sees for an operation is exactly what was executed.

use crate::command::args::{CommandBuffer, join_command, quote_for_command_line};
use crate::command::holder::{CommandHolder, CommandInfo};
use crate::error::{NosqlError, NosqlResult};
use crate::traits::CommandTranslator;
use crate::traits::translator::{
    DB_DELETE_KEY_COMMAND, DB_GET_KEY_COMMAND, DB_GET_TTL_COMMAND, DB_RENAME_KEY_COMMAND,
    DB_SET_KEY_COMMAND, DB_SET_TTL_COMMAND,
};
use crate::types::{Cursor, KeyString, NDbKValue, NKey, NO_TTL, Ttl, Value, ValueType};

pub const REDIS_PERSIST_KEY_COMMAND: &str = "PERSIST";
pub const REDIS_TYPE_COMMAND: &str = "TYPE";
pub const REDIS_SCAN_COMMAND: &str = "SCAN";
pub const REDIS_PUBLISH_COMMAND: &str = "PUBLISH";
pub const REDIS_SUBSCRIBE_COMMAND: &str = "SUBSCRIBE";

pub struct RedisTranslator {
    commands: Vec<CommandInfo>,
}

impl RedisTranslator {
    pub fn new<C>(table: &[CommandHolder<C>]) -> Self {
        RedisTranslator {
            commands: table.iter().map(|holder| holder.info).collect(),
        }
    }

    /// `TYPE <key>`
    pub fn type_command(&self, key: &NKey) -> NosqlResult<CommandBuffer> {
        if key.key().is_empty() {
            return Err(NosqlError::invalid_input());
        }
        Ok(join_command([
            REDIS_TYPE_COMMAND.as_bytes().to_vec(),
            key.key().for_command_line(),
        ]))
    }

    /// `SCAN <cursor> MATCH <pattern> COUNT <count>`
    pub fn scan_command(&self, cursor: Cursor, pattern: &str, count: u64) -> CommandBuffer {
        join_command([
            REDIS_SCAN_COMMAND.as_bytes().to_vec(),
            cursor.to_string().into_bytes(),
            b"MATCH".to_vec(),
            quote_for_command_line(pattern.as_bytes()),
            b"COUNT".to_vec(),
            count.to_string().into_bytes(),
        ])
    }

    pub fn publish_command(&self, channel: &str, message: &[u8]) -> NosqlResult<CommandBuffer> {
        if channel.is_empty() {
            return Err(NosqlError::invalid_input());
        }
        Ok(join_command([
            REDIS_PUBLISH_COMMAND.as_bytes().to_vec(),
            quote_for_command_line(channel.as_bytes()),
            quote_for_command_line(message),
        ]))
    }

    pub fn subscribe_command<S: AsRef<str>>(&self, channels: &[S]) -> NosqlResult<CommandBuffer> {
        if channels.is_empty() || channels.iter().any(|c| c.as_ref().is_empty()) {
            return Err(NosqlError::invalid_input());
        }
        let mut parts = vec![REDIS_SUBSCRIBE_COMMAND.as_bytes().to_vec()];
        parts.extend(channels.iter().map(|c| quote_for_command_line(c.as_ref().as_bytes())));
        Ok(join_command(parts))
    }
}

fn typed_line(command: &str, key: &KeyString, tail: Vec<u8>) -> CommandBuffer {
    let mut parts = vec![command.as_bytes().to_vec(), key.for_command_line()];
    if !tail.is_empty() {
        parts.push(tail);
    }
    join_command(parts)
}

impl CommandTranslator for RedisTranslator {
    fn commands(&self) -> &[CommandInfo] {
        &self.commands
    }

    fn create_key_command_impl(&self, key: &NDbKValue) -> NosqlResult<CommandBuffer> {
        let value = key.value();
        let command = match value.as_ref() {
            Value::String(_) | Value::Integer(_) => DB_SET_KEY_COMMAND,
            Value::Array(items) if !items.is_empty() => "RPUSH",
            Value::Set(members) if !members.is_empty() => "SADD",
            Value::ZSet(members) if !members.is_empty() => "ZADD",
            Value::Hash(fields) if !fields.is_empty() => "HSET",
            // Redis has no empty collections and no null.
            _ => return Err(NosqlError::not_supported(DB_SET_KEY_COMMAND)),
        };
        Ok(typed_line(command, key.key().key(), value.to_command_line()))
    }

    fn load_key_command_impl(&self, key: &NKey, value_type: ValueType) -> NosqlResult<CommandBuffer> {
        let (command, tail): (&str, &[u8]) = match value_type {
            ValueType::String | ValueType::Integer => (DB_GET_KEY_COMMAND, b""),
            ValueType::Array => ("LRANGE", b"0 -1"),
            ValueType::Set => ("SMEMBERS", b""),
            ValueType::ZSet => ("ZRANGE", b"0 -1 WITHSCORES"),
            ValueType::Hash => ("HGETALL", b""),
            ValueType::Null => return Err(NosqlError::not_supported(DB_GET_KEY_COMMAND)),
        };
        Ok(typed_line(command, key.key(), tail.to_vec()))
    }

    fn delete_key_command_impl(&self, key: &NKey) -> NosqlResult<CommandBuffer> {
        Ok(typed_line(DB_DELETE_KEY_COMMAND, key.key(), Vec::new()))
    }

    fn rename_key_command_impl(&self, key: &NKey, new_name: &KeyString) -> NosqlResult<CommandBuffer> {
        Ok(typed_line(DB_RENAME_KEY_COMMAND, key.key(), new_name.for_command_line()))
    }

    fn change_key_ttl_command_impl(&self, key: &NKey, ttl: Ttl) -> NosqlResult<CommandBuffer> {
        if ttl == NO_TTL {
            return Ok(typed_line(REDIS_PERSIST_KEY_COMMAND, key.key(), Vec::new()));
        }
        Ok(typed_line(DB_SET_TTL_COMMAND, key.key(), ttl.to_string().into_bytes()))
    }

    fn load_key_ttl_command_impl(&self, key: &NKey) -> NosqlResult<CommandBuffer> {
        Ok(typed_line(DB_GET_TTL_COMMAND, key.key(), Vec::new()))
    }

    fn is_load_key_command_impl(&self, info: &CommandInfo) -> bool {
        info.name == DB_GET_KEY_COMMAND
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::holder::version;
    use assert_matches::assert_matches;

    fn noop(_: &mut (), _: &[Vec<u8>], _: &mut crate::command::FastoObject) -> NosqlResult<()> {
        Ok(())
    }

    static TABLE: [CommandHolder<()>; 2] = [
        CommandHolder::new("GET", "<key>", "Get the value of a key.", version(1, 0, 0), "GET key", 1, 1, noop),
        CommandHolder::new("TTL", "<key>", "Get the time to live for a key.", version(1, 0, 0), "TTL key", 1, 1, noop),
    ];

    fn translator() -> RedisTranslator {
        RedisTranslator::new(&TABLE)
    }

    fn create(value: Value) -> Vec<u8> {
        translator()
            .create_key_command(&NDbKValue::new(NKey::new("k"), value))
            .unwrap()
    }

    #[test]
    fn typed_create_commands() {
        assert_eq!(create(Value::from("v")), b"SET k v".to_vec());
        assert_eq!(create(Value::from(7)), b"SET k 7".to_vec());
        assert_eq!(
            create(Value::Array(vec![Value::from("a"), Value::from("b c")])),
            b"RPUSH k a \"b c\"".to_vec()
        );
        assert_eq!(create(Value::Set(vec![b"x".to_vec()])), b"SADD k x".to_vec());
        assert_eq!(create(Value::ZSet(vec![(b"m".to_vec(), 2.0)])), b"ZADD k 2 m".to_vec());
        assert_eq!(
            create(Value::Hash(vec![(b"f".to_vec(), b"v".to_vec())])),
            b"HSET k f v".to_vec()
        );
    }

    #[test]
    fn null_and_empty_collections_are_rejected() {
        let t = translator();
        for value in [Value::Null, Value::Array(vec![]), Value::Hash(vec![])] {
            let record = NDbKValue::new(NKey::new("k"), value);
            assert_matches!(t.create_key_command(&record), Err(NosqlError::NotSupported(_)));
        }
    }

    #[test]
    fn typed_load_commands() {
        let t = translator();
        let key = NKey::new("k");
        assert_eq!(t.load_key_command(&key, ValueType::String).unwrap(), b"GET k".to_vec());
        assert_eq!(t.load_key_command(&key, ValueType::Array).unwrap(), b"LRANGE k 0 -1".to_vec());
        assert_eq!(t.load_key_command(&key, ValueType::Set).unwrap(), b"SMEMBERS k".to_vec());
        assert_eq!(
            t.load_key_command(&key, ValueType::ZSet).unwrap(),
            b"ZRANGE k 0 -1 WITHSCORES".to_vec()
        );
        assert_eq!(t.load_key_command(&key, ValueType::Hash).unwrap(), b"HGETALL k".to_vec());
    }

    #[test]
    fn ttl_commands() {
        let t = translator();
        let key = NKey::new("k");
        assert_eq!(t.change_key_ttl_command(&key, NO_TTL).unwrap(), b"PERSIST k".to_vec());
        assert_eq!(t.change_key_ttl_command(&key, 30).unwrap(), b"EXPIRE k 30".to_vec());
        assert_eq!(t.load_key_ttl_command(&key).unwrap(), b"TTL k".to_vec());
    }

    #[test]
    fn pubsub_and_scan_lines() {
        let t = translator();
        assert_eq!(t.scan_command(0, "user:*", 10), b"SCAN 0 MATCH user:* COUNT 10".to_vec());
        assert_eq!(t.publish_command("news", b"hello world").unwrap(), b"PUBLISH news \"hello world\"".to_vec());
        assert_eq!(t.subscribe_command(&["a", "b"]).unwrap(), b"SUBSCRIBE a b".to_vec());
        assert_matches!(t.subscribe_command::<&str>(&[]), Err(NosqlError::InvalidArgument(_)));
        assert_matches!(t.publish_command("", b"x"), Err(NosqlError::InvalidArgument(_)));
    }

    #[test]
    fn recognises_get_lines() {
        let t = translator();
        assert_eq!(t.is_load_key_command(b"get user:1").unwrap(), Some(KeyString::from("user:1")));
        assert_eq!(t.is_load_key_command(b"TTL user:1").unwrap(), None);
    }
}
