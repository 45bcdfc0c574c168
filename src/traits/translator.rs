//! Mapping from generic key operations to backend command lines.
//!
//! Backends implement the `*_impl` hooks; callers use the provided methods,
//! which validate their input first. Validation failures never reach a hook.

use crate::command::args::{CommandBuffer, join_command, quote_for_command_line, split_args};
use crate::command::holder::CommandInfo;
use crate::error::{NosqlError, NosqlResult};
use crate::types::{KeyString, NDbKValue, NKey, Ttl, ValueType};

pub const DB_SELECTDB_COMMAND: &str = "SELECT";
pub const DB_FLUSHDB_COMMAND: &str = "FLUSHDB";
pub const DB_GET_KEY_COMMAND: &str = "GET";
pub const DB_SET_KEY_COMMAND: &str = "SET";
pub const DB_DELETE_KEY_COMMAND: &str = "DEL";
pub const DB_RENAME_KEY_COMMAND: &str = "RENAME";
pub const DB_SET_TTL_COMMAND: &str = "EXPIRE";
pub const DB_GET_TTL_COMMAND: &str = "TTL";

pub trait CommandTranslator: Send + Sync {
    /// Metadata of every command the backend accepts.
    fn commands(&self) -> &[CommandInfo];

    fn create_key_command_impl(&self, key: &NDbKValue) -> NosqlResult<CommandBuffer>;
    fn load_key_command_impl(&self, key: &NKey, value_type: ValueType) -> NosqlResult<CommandBuffer>;
    fn delete_key_command_impl(&self, key: &NKey) -> NosqlResult<CommandBuffer>;
    fn rename_key_command_impl(&self, key: &NKey, new_name: &KeyString) -> NosqlResult<CommandBuffer>;
    fn change_key_ttl_command_impl(&self, key: &NKey, ttl: Ttl) -> NosqlResult<CommandBuffer>;
    fn load_key_ttl_command_impl(&self, key: &NKey) -> NosqlResult<CommandBuffer>;

    /// True when `info` is the command that loads a key's value.
    fn is_load_key_command_impl(&self, info: &CommandInfo) -> bool;

    fn select_db_command(&self, name: &str) -> NosqlResult<CommandBuffer> {
        if name.is_empty() {
            return Err(NosqlError::invalid_input());
        }
        Ok(join_command([
            DB_SELECTDB_COMMAND.as_bytes().to_vec(),
            quote_for_command_line(name.as_bytes()),
        ]))
    }

    fn flush_db_command(&self) -> CommandBuffer {
        DB_FLUSHDB_COMMAND.as_bytes().to_vec()
    }

    fn create_key_command(&self, key: &NDbKValue) -> NosqlResult<CommandBuffer> {
        check_key(key.key())?;
        self.create_key_command_impl(key)
    }

    fn load_key_command(&self, key: &NKey, value_type: ValueType) -> NosqlResult<CommandBuffer> {
        check_key(key)?;
        self.load_key_command_impl(key, value_type)
    }

    fn delete_key_command(&self, key: &NKey) -> NosqlResult<CommandBuffer> {
        check_key(key)?;
        self.delete_key_command_impl(key)
    }

    fn rename_key_command(&self, key: &NKey, new_name: &KeyString) -> NosqlResult<CommandBuffer> {
        check_key(key)?;
        if new_name.is_empty() {
            return Err(NosqlError::invalid_input());
        }
        self.rename_key_command_impl(key, new_name)
    }

    fn change_key_ttl_command(&self, key: &NKey, ttl: Ttl) -> NosqlResult<CommandBuffer> {
        check_key(key)?;
        self.change_key_ttl_command_impl(key, ttl)
    }

    fn load_key_ttl_command(&self, key: &NKey) -> NosqlResult<CommandBuffer> {
        check_key(key)?;
        self.load_key_ttl_command_impl(key)
    }

    /// Returns the key when `command` is a load-key command line.
    fn is_load_key_command(&self, command: &[u8]) -> NosqlResult<Option<KeyString>> {
        let argv = split_args(command)?;
        let (info, offset) = self.test_command_line_args(&argv)?;
        if !self.is_load_key_command_impl(info) {
            return Ok(None);
        }
        Ok(argv.get(offset).map(|key| KeyString::from(key.as_slice())))
    }

    /// Finds the table entry whose (possibly multi-word) name prefixes
    /// `argv`, preferring the longest name. Returns the argument offset.
    fn find_command(&self, argv: &[Vec<u8>]) -> NosqlResult<(&CommandInfo, usize)> {
        self.commands()
            .iter()
            .filter_map(|info| info.match_name(argv).map(|offset| (info, offset)))
            .max_by_key(|(_, offset)| *offset)
            .ok_or_else(|| NosqlError::unknown_sequence(argv))
    }

    fn test_command_args(&self, info: &CommandInfo, argv: &[Vec<u8>]) -> NosqlResult<()> {
        info.test_args(argv.len())
    }

    fn test_command_line_args(&self, argv: &[Vec<u8>]) -> NosqlResult<(&CommandInfo, usize)> {
        let (info, offset) = self.find_command(argv)?;
        self.test_command_args(info, &argv[offset..])?;
        Ok((info, offset))
    }

    fn test_command_line(&self, command: &[u8]) -> NosqlResult<()> {
        let argv = split_args(command)?;
        self.test_command_line_args(&argv).map(|_| ())
    }
}

fn check_key(key: &NKey) -> NosqlResult<()> {
    if key.key().is_empty() {
        return Err(NosqlError::invalid_input());
    }
    Ok(())
}
