//! Bounded IRC line parsing.
//!
//! A line is split into a command and an ordered list of parameters:
//!
//! ```text
//! CMD PARAM1 PARAM2 :trailing parameter with spaces\r\n
//! ^^^ ^^^^^^ ^^^^^^  ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//! cmd   p0     p1     p2 (everything after ':' up to CRLF)
//! ```
//!
//! Every field is bounded. Oversized tokens are cut to their limit and
//! parameters past [`MAX_PARAMS`] are dropped; neither is an error.

use std::fmt;

/// Maximum length of a command, in bytes.
pub const MAX_COMMAND_LEN: usize = 16;

/// Maximum length of a single parameter, in bytes.
pub const MAX_PARAM_LEN: usize = 256;

/// Maximum number of parameters retained per message.
pub const MAX_PARAMS: usize = 8;

/// A parsed IRC command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Message {
    /// Command name, at most [`MAX_COMMAND_LEN`] bytes.
    pub command: String,
    /// Parameters in wire order, at most [`MAX_PARAMS`] entries of at most
    /// [`MAX_PARAM_LEN`] bytes each.
    pub params: Vec<String>,
}

impl Message {
    /// Parse a raw line. See [`parse`].
    pub fn parse(raw: &[u8]) -> Self {
        parse(raw)
    }

    /// Get the parameter at `index`, if present.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Whether the line carried no command at all (blank line).
    pub fn is_empty(&self) -> bool {
        self.command.is_empty()
    }

    fn push_param(&mut self, token: &str) {
        if self.params.len() < MAX_PARAMS {
            self.params
                .push(truncate_str(token, MAX_PARAM_LEN).to_owned());
        }
    }
}

/// Parse one IRC line.
///
/// Trailing `\r`/`\n` bytes are ignored, so both `CMD\r\n` and `CMD` yield the
/// same message. Invalid UTF-8 is replaced with U+FFFD before tokenizing.
///
/// Tokens are separated by one or more spaces. The first token is the
/// command. A parameter token starting with `:` swallows the remainder of
/// the line, spaces included, and ends parsing.
pub fn parse(raw: &[u8]) -> Message {
    let line = String::from_utf8_lossy(strip_line_ending(raw));
    let mut msg = Message::default();

    let (command, mut rest) = split_token(line.trim_start_matches(' '));
    msg.command = truncate_str(command, MAX_COMMAND_LEN).to_owned();

    while msg.params.len() < MAX_PARAMS {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }

        if let Some(trailing) = rest.strip_prefix(':') {
            msg.push_param(trailing);
            break;
        }

        let (token, tail) = split_token(rest);
        msg.push_param(token);
        rest = tail;
    }

    msg
}

fn strip_line_ending(raw: &[u8]) -> &[u8] {
    let end = raw
        .iter()
        .rposition(|b| *b != b'\r' && *b != b'\n')
        .map_or(0, |pos| pos + 1);
    &raw[..end]
}

fn split_token(s: &str) -> (&str, &str) {
    match s.find(' ') {
        Some(pos) => (&s[..pos], &s[pos + 1..]),
        None => (s, ""),
    }
}

/// Cut `s` to at most `max` bytes without splitting a UTF-8 sequence.
fn truncate_str(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

impl fmt::Display for Message {
    /// Render in wire form, without the line terminator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)?;
        let Some((last, middle)) = self.params.split_last() else {
            return Ok(());
        };
        for param in middle {
            write!(f, " {param}")?;
        }
        if last.is_empty() || last.contains(' ') || last.starts_with(':') {
            write!(f, " :{last}")
        } else {
            write!(f, " {last}")
        }
    }
}
