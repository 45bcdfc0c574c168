//! Translator for engines driven through function calls rather than a
//! wire protocol.
//!
//! The rendered lines are what the same operation looks like in the
//! backend's own command table, so they can be shown to the user or fed
//! back through `execute`.

use crate::command::args::{CommandBuffer, join_command, quote_for_command_line};
use crate::command::holder::{CommandHolder, CommandInfo};
use crate::error::{NosqlError, NosqlResult};
use crate::traits::CommandTranslator;
use crate::traits::translator::{
    DB_DELETE_KEY_COMMAND, DB_GET_KEY_COMMAND, DB_GET_TTL_COMMAND, DB_RENAME_KEY_COMMAND,
    DB_SET_KEY_COMMAND, DB_SET_TTL_COMMAND,
};
use crate::types::{KeyString, NDbKValue, NKey, Ttl, ValueType};

pub struct EmbeddedTranslator {
    commands: Vec<CommandInfo>,
    supports_ttl: bool,
}

impl EmbeddedTranslator {
    pub fn new<C>(table: &[CommandHolder<C>], supports_ttl: bool) -> Self {
        EmbeddedTranslator {
            commands: table.iter().map(|holder| holder.info).collect(),
            supports_ttl,
        }
    }
}

impl CommandTranslator for EmbeddedTranslator {
    fn commands(&self) -> &[CommandInfo] {
        &self.commands
    }

    fn create_key_command_impl(&self, key: &NDbKValue) -> NosqlResult<CommandBuffer> {
        let bytes = key
            .value()
            .to_storage_bytes()
            .ok_or_else(|| NosqlError::not_supported(DB_SET_KEY_COMMAND))?;
        Ok(join_command([
            DB_SET_KEY_COMMAND.as_bytes().to_vec(),
            key.key().key().for_command_line(),
            quote_for_command_line(&bytes),
        ]))
    }

    fn load_key_command_impl(&self, key: &NKey, value_type: ValueType) -> NosqlResult<CommandBuffer> {
        match value_type {
            ValueType::String | ValueType::Integer => Ok(join_command([
                DB_GET_KEY_COMMAND.as_bytes().to_vec(),
                key.key().for_command_line(),
            ])),
            _ => Err(NosqlError::not_supported(DB_GET_KEY_COMMAND)),
        }
    }

    fn delete_key_command_impl(&self, key: &NKey) -> NosqlResult<CommandBuffer> {
        Ok(join_command([
            DB_DELETE_KEY_COMMAND.as_bytes().to_vec(),
            key.key().for_command_line(),
        ]))
    }

    fn rename_key_command_impl(&self, key: &NKey, new_name: &KeyString) -> NosqlResult<CommandBuffer> {
        Ok(join_command([
            DB_RENAME_KEY_COMMAND.as_bytes().to_vec(),
            key.key().for_command_line(),
            new_name.for_command_line(),
        ]))
    }

    fn change_key_ttl_command_impl(&self, key: &NKey, ttl: Ttl) -> NosqlResult<CommandBuffer> {
        if !self.supports_ttl {
            return Err(NosqlError::not_supported(DB_SET_TTL_COMMAND));
        }
        Ok(join_command([
            DB_SET_TTL_COMMAND.as_bytes().to_vec(),
            key.key().for_command_line(),
            ttl.to_string().into_bytes(),
        ]))
    }

    fn load_key_ttl_command_impl(&self, key: &NKey) -> NosqlResult<CommandBuffer> {
        if !self.supports_ttl {
            return Err(NosqlError::not_supported(DB_GET_TTL_COMMAND));
        }
        Ok(join_command([
            DB_GET_TTL_COMMAND.as_bytes().to_vec(),
            key.key().for_command_line(),
        ]))
    }

    fn is_load_key_command_impl(&self, info: &CommandInfo) -> bool {
        info.name == DB_GET_KEY_COMMAND
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::holder::version;
    use crate::types::Value;
    use assert_matches::assert_matches;

    fn noop(_: &mut (), _: &[Vec<u8>], _: &mut crate::command::FastoObject) -> NosqlResult<()> {
        Ok(())
    }

    static TABLE: [CommandHolder<()>; 2] = [
        CommandHolder::new("GET", "<key>", "Get the value of a key.", version(0, 1, 0), "GET key", 1, 1, noop),
        CommandHolder::new("SET", "<key> <value>", "Set the value of a key.", version(0, 1, 0), "SET key value", 2, 2, noop),
    ];

    #[test]
    fn renders_plain_and_binary_keys() {
        let translator = EmbeddedTranslator::new(&TABLE, false);
        let record = NDbKValue::new(NKey::new("key"), Value::from("value"));
        assert_eq!(translator.create_key_command(&record).unwrap(), b"SET key value".to_vec());

        let record = NDbKValue::new(NKey::new("a key"), Value::string(vec![0u8, 0xff]));
        assert_eq!(
            translator.create_key_command(&record).unwrap(),
            b"SET \"a key\" \"\\x00\\xff\"".to_vec()
        );
        assert_eq!(
            translator.rename_key_command(&NKey::new("a"), &"b".into()).unwrap(),
            b"RENAME a b".to_vec()
        );
    }

    #[test]
    fn rejects_what_the_engine_cannot_store() {
        let translator = EmbeddedTranslator::new(&TABLE, false);
        let hash = NDbKValue::new(NKey::new("h"), Value::Hash(vec![(b"f".to_vec(), b"v".to_vec())]));
        assert_matches!(translator.create_key_command(&hash), Err(NosqlError::NotSupported(_)));
        assert_matches!(translator.load_key_command(&NKey::new("h"), ValueType::Hash), Err(NosqlError::NotSupported(_)));
        assert_matches!(translator.change_key_ttl_command(&NKey::new("k"), 10), Err(NosqlError::NotSupported(_)));
        assert_matches!(translator.delete_key_command(&NKey::new("")), Err(NosqlError::InvalidArgument(_)));
    }

    #[test]
    fn ttl_commands_when_supported() {
        let translator = EmbeddedTranslator::new(&TABLE, true);
        assert_eq!(translator.change_key_ttl_command(&NKey::new("k"), 10).unwrap(), b"EXPIRE k 10".to_vec());
        assert_eq!(translator.load_key_ttl_command(&NKey::new("k")).unwrap(), b"TTL k".to_vec());
    }

    #[test]
    fn command_lookup_and_arity() {
        let translator = EmbeddedTranslator::new(&TABLE, false);
        assert!(translator.test_command_line(b"get k").is_ok());
        assert_matches!(translator.test_command_line(b"GET"), Err(NosqlError::InvalidArgument(msg)) if msg.contains("GET"));
        assert_matches!(translator.test_command_line(b"FOO k"), Err(NosqlError::InvalidArgument(msg)) if msg.starts_with("Unknown sequence"));
        assert_eq!(translator.is_load_key_command(b"GET \"my key\"").unwrap(), Some(KeyString::from("my key")));
        assert_eq!(translator.is_load_key_command(b"SET k v").unwrap(), None);
    }
}
