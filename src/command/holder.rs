//! Static command tables.
//!
//! Every backend publishes one `static` slice of [`CommandHolder`]s: the
//! command's metadata plus the handler that runs it against that backend's
//! connection type. Tables are immutable and built at compile time.

use crate::command::output::FastoObject;
use crate::error::{NosqlError, NosqlResult};

/// Maximum-arity sentinel for variadic commands.
pub const INFINITE_COMMAND_ARGS: usize = usize::MAX;

/// Handler signature: connection, arguments after the command name, output.
pub type CommandFunc<C> = fn(&mut C, &[Vec<u8>], &mut FastoObject) -> NosqlResult<()>;

/// Command metadata used for lookup, arity checks and `HELP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: &'static str,
    pub params: &'static str,
    pub summary: &'static str,
    /// Version the command appeared in, encoded as `major << 16 | minor << 8 | patch`.
    pub since: u32,
    pub example: &'static str,
    pub min_args: usize,
    pub max_args: usize,
}

impl CommandInfo {
    /// Number of leading arguments that form the command name.
    pub fn name_len(&self) -> usize {
        self.name.split_whitespace().count()
    }

    /// Case-insensitive match of the (possibly multi-word) name against
    /// the start of `argv`. Returns the argument offset on success.
    pub fn match_name<A: AsRef<[u8]>>(&self, argv: &[A]) -> Option<usize> {
        let words: Vec<&str> = self.name.split_whitespace().collect();
        if argv.len() < words.len() {
            return None;
        }
        let all = words
            .iter()
            .zip(argv)
            .all(|(word, arg)| arg.as_ref().eq_ignore_ascii_case(word.as_bytes()));
        all.then_some(words.len())
    }

    /// Arity check of the arguments following the name.
    pub fn test_args(&self, argc: usize) -> NosqlResult<()> {
        if argc < self.min_args || argc > self.max_args {
            return Err(NosqlError::invalid_input_arguments(self.name));
        }
        Ok(())
    }

    pub fn since_readable(&self) -> String {
        format!("{}.{}.{}", self.since >> 16, (self.since >> 8) & 0xff, self.since & 0xff)
    }
}

/// A table entry: metadata plus the handler for connection type `C`.
pub struct CommandHolder<C> {
    pub info: CommandInfo,
    pub func: CommandFunc<C>,
}

impl<C> CommandHolder<C> {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        name: &'static str,
        params: &'static str,
        summary: &'static str,
        since: u32,
        example: &'static str,
        min_args: usize,
        max_args: usize,
        func: CommandFunc<C>,
    ) -> Self {
        CommandHolder {
            info: CommandInfo {
                name,
                params,
                summary,
                since,
                example,
                min_args,
                max_args,
            },
            func,
        }
    }
}

/// Encodes a `major.minor.patch` version for [`CommandInfo::since`].
pub const fn version(major: u32, minor: u32, patch: u32) -> u32 {
    (major << 16) | (minor << 8) | patch
}
