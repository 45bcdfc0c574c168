//! Command-line argument splitting and rendering.
//!
//! The splitter understands the same syntax the renderer produces, so a
//! command built by a translator always splits back into the exact
//! argument bytes it was built from:
//!
//! - arguments are separated by ASCII whitespace;
//! - `"..."` strings accept `\n \r \t \a \b \" \\` and `\xHH` escapes;
//! - `'...'` strings accept only `\'`;
//! - a closing quote must be followed by whitespace or end of input.

use crate::error::{NosqlError, NosqlResult};

/// A rendered command, ready to be split and sent.
pub type CommandBuffer = Vec<u8>;

/// Split arguments of one command.
pub type CommandArgs = Vec<Vec<u8>>;

/// Splits a multi-line input into one buffer per non-blank line.
pub fn parse_commands(input: &[u8]) -> Vec<CommandBuffer> {
    input
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter(|line| line.iter().any(|b| !b.is_ascii_whitespace()))
        .map(|line| line.to_vec())
        .collect()
}

/// Splits one command line into arguments.
pub fn split_args(line: &[u8]) -> NosqlResult<CommandArgs> {
    let mut args = Vec::new();
    let mut pos = 0;

    loop {
        while pos < line.len() && line[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= line.len() {
            return Ok(args);
        }

        let mut current = Vec::new();
        let mut in_double = false;
        let mut in_single = false;
        loop {
            if in_double {
                match line.get(pos) {
                    None => return Err(unbalanced()),
                    Some(b'\\') if pos + 3 < line.len() && line[pos + 1] == b'x' => {
                        match (hex_value(line[pos + 2]), hex_value(line[pos + 3])) {
                            (Some(hi), Some(lo)) => {
                                current.push(hi * 16 + lo);
                                pos += 3;
                            }
                            _ => {
                                current.push(b'x');
                                pos += 1;
                            }
                        }
                    }
                    Some(b'\\') if pos + 1 < line.len() => {
                        pos += 1;
                        current.push(match line[pos] {
                            b'n' => b'\n',
                            b'r' => b'\r',
                            b't' => b'\t',
                            b'b' => 0x08,
                            b'a' => 0x07,
                            other => other,
                        });
                    }
                    Some(b'"') => {
                        if line.get(pos + 1).is_some_and(|b| !b.is_ascii_whitespace()) {
                            return Err(unbalanced());
                        }
                        in_double = false;
                        pos += 1;
                        break;
                    }
                    Some(other) => current.push(*other),
                }
            } else if in_single {
                match line.get(pos) {
                    None => return Err(unbalanced()),
                    Some(b'\\') if line.get(pos + 1) == Some(&b'\'') => {
                        pos += 1;
                        current.push(b'\'');
                    }
                    Some(b'\'') => {
                        if line.get(pos + 1).is_some_and(|b| !b.is_ascii_whitespace()) {
                            return Err(unbalanced());
                        }
                        in_single = false;
                        pos += 1;
                        break;
                    }
                    Some(other) => current.push(*other),
                }
            } else {
                match line.get(pos) {
                    None => break,
                    Some(b) if b.is_ascii_whitespace() => break,
                    Some(b'"') => in_double = true,
                    Some(b'\'') => in_single = true,
                    Some(other) => current.push(*other),
                }
            }
            pos += 1;
        }
        debug_assert!(!in_double && !in_single);
        args.push(current);
    }
}

/// Renders one argument so that [`split_args`] yields it back unchanged.
pub fn quote_for_command_line(bytes: &[u8]) -> Vec<u8> {
    let plain = !bytes.is_empty()
        && bytes
            .iter()
            .all(|b| b.is_ascii_graphic() && !matches!(b, b'"' | b'\'' | b'\\'));
    if plain {
        return bytes.to_vec();
    }

    let mut out = Vec::with_capacity(bytes.len() + 2);
    out.push(b'"');
    for &b in bytes {
        match b {
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'"' => out.extend_from_slice(b"\\\""),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            0x07 => out.extend_from_slice(b"\\a"),
            0x08 => out.extend_from_slice(b"\\b"),
            b if b.is_ascii_graphic() || b == b' ' => out.push(b),
            b => out.extend_from_slice(format!("\\x{b:02x}").as_bytes()),
        }
    }
    out.push(b'"');
    out
}

/// Joins already-rendered parts with single spaces.
pub fn join_command<I, P>(parts: I) -> CommandBuffer
where
    I: IntoIterator<Item = P>,
    P: AsRef<[u8]>,
{
    let mut out = Vec::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            out.push(b' ');
        }
        out.extend_from_slice(part.as_ref());
    }
    out
}

/// Lossy UTF-8 view of an argument, for names and numbers.
pub fn arg_str(arg: &[u8]) -> String {
    String::from_utf8_lossy(arg).into_owned()
}

/// Parses a numeric argument, failing with the command's arity error.
pub fn parse_arg<T: std::str::FromStr>(arg: &[u8], command: &str) -> NosqlResult<T> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .ok_or_else(|| NosqlError::invalid_input_arguments(command))
}

fn hex_value(c: u8) -> Option<u8> {
    (c as char).to_digit(16).map(|d| d as u8)
}

fn unbalanced() -> NosqlError {
    NosqlError::InvalidArgument("Invalid argument(s): unbalanced quotes".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn split(line: &str) -> Vec<String> {
        split_args(line.as_bytes())
            .unwrap()
            .into_iter()
            .map(|a| String::from_utf8(a).unwrap())
            .collect()
    }

    #[test]
    fn splits_plain_words() {
        assert_eq!(split("SET key value"), vec!["SET", "key", "value"]);
        assert_eq!(split("  GET   key  "), vec!["GET", "key"]);
        assert!(split("   ").is_empty());
    }

    #[test]
    fn splits_quoted_arguments() {
        assert_eq!(split("SET \"a b\" 'c d'"), vec!["SET", "a b", "c d"]);
        assert_eq!(split("SET k \"line\\nbreak\""), vec!["SET", "k", "line\nbreak"]);
        assert_eq!(split("SET k 'it\\'s'"), vec!["SET", "k", "it's"]);
        assert_eq!(split("SET k \"\""), vec!["SET", "k", ""]);
    }

    #[test]
    fn hex_escapes_are_binary_safe() {
        let args = split_args(b"SET \"\\x00\\xff\" v").unwrap();
        assert_eq!(args[1], vec![0x00, 0xff]);
    }

    #[test]
    fn rejects_unbalanced_quotes() {
        assert_matches!(split_args(b"SET \"open"), Err(NosqlError::InvalidArgument(_)));
        assert_matches!(split_args(b"SET \"a\"b"), Err(NosqlError::InvalidArgument(_)));
        assert_matches!(split_args(b"SET 'open"), Err(NosqlError::InvalidArgument(_)));
    }

    #[test]
    fn rendering_splits_back() {
        let samples: [&[u8]; 6] = [b"plain", b"two words", b"", b"quo\"te", b"back\\slash", &[0, 1, 0xfe, b'\n']];
        for sample in samples {
            let line = join_command([b"SET".to_vec(), quote_for_command_line(sample)]);
            let args = split_args(&line).unwrap();
            assert_eq!(args, vec![b"SET".to_vec(), sample.to_vec()], "sample {sample:?}");
        }
    }

    #[test]
    fn plain_arguments_render_verbatim() {
        assert_eq!(join_command(["SET", "key", "value"]), b"SET key value".to_vec());
    }

    #[test]
    fn multi_line_input() {
        let cmds = parse_commands(b"SET a 1\r\n\nGET a\n  \n");
        assert_eq!(cmds, vec![b"SET a 1".to_vec(), b"GET a".to_vec()]);
    }
}
