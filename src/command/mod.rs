//! Command-line surface: argument handling, static command tables, the
//! output tree and the handlers shared by every backend.

pub mod args;
pub mod handlers;
pub mod holder;
pub mod output;

pub use args::{CommandArgs, CommandBuffer, join_command, parse_commands, quote_for_command_line, split_args};
pub use holder::{CommandFunc, CommandHolder, CommandInfo, INFINITE_COMMAND_ARGS, version};
pub use output::FastoObject;
