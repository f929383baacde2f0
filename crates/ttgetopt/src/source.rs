//! Building an argument list from a file or a single string.
//!
//! Both adapters produce an [`ArgList`] whose first entry plays the role
//! of `argv[0]`.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::ops::Deref;
use std::path::Path;

use crate::error::{ParseError, Result};

/// Name used as `argv[0]` when reading standard input.
pub const STDIN_NAME: &str = "<stdin>";

/// Owned argument list; index 0 is the program or source name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgList(Vec<String>);

impl ArgList {
    pub fn new(args: Vec<String>) -> Self {
        ArgList(args)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    pub(crate) fn as_strs(&self) -> Vec<&str> {
        self.0.iter().map(String::as_str).collect()
    }
}

impl Deref for ArgList {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for ArgList {
    fn from(args: Vec<String>) -> Self {
        ArgList(args)
    }
}

// -- File --------------------------------------------------------------------

/// Read options from `path`, or standard input when `None`.
///
/// One option per line: a name, then an optional value. Leading and
/// trailing blanks are ignored, as are empty lines and lines starting
/// with `#`. Either word may be double-quoted.
pub fn args_from_file(path: Option<&Path>) -> Result<ArgList> {
    match path {
        Some(path) => {
            let name = path.display().to_string();
            let file = File::open(path)
                .map_err(|e| ParseError::Source(format!("Can't open {}: {}", name, e)))?;
            args_from_reader(BufReader::new(file), &name)
        }
        None => args_from_reader(io::stdin().lock(), STDIN_NAME),
    }
}

/// [`args_from_file`] over any reader; `name` becomes `argv[0]`.
pub fn args_from_reader<R: BufRead>(reader: R, name: &str) -> Result<ArgList> {
    let mut args = vec![name.to_string()];
    for line in reader.lines() {
        let line = line.map_err(|e| ParseError::Source(format!("{}: {}", name, e)))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (option, rest) = next_word(line)?;
        args.push(option);
        let rest = rest.trim_start();
        if !rest.is_empty() {
            let (value, _) = next_word(rest)?;
            args.push(value);
        }
    }
    tracing::debug!(source = name, count = args.len() - 1, "read arguments from file");
    Ok(ArgList(args))
}

/// Split off the first word of `s` (which starts with a non-blank).
///
/// A word beginning with `"` runs to the matching unescaped quote and is
/// returned without the quotes, with `\"` and `\\` unescaped. Otherwise a
/// word ends at the first blank not preceded by a backslash, and is
/// returned as written.
fn next_word(s: &str) -> Result<(String, &str)> {
    if let Some(body) = s.strip_prefix('"') {
        let mut word = String::new();
        let mut escaped = false;
        for (i, c) in body.char_indices() {
            match c {
                '\\' if !escaped => escaped = true,
                '"' if !escaped => return Ok((word, &body[i + 1..])),
                _ => {
                    if escaped && c != '"' && c != '\\' {
                        word.push('\\');
                    }
                    word.push(c);
                    escaped = false;
                }
            }
        }
        return Err(ParseError::Source("unterminated quoted string".to_string()));
    }

    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if c.is_whitespace() && !escaped {
            return Ok((s[..i].to_string(), &s[i..]));
        }
        escaped = c == '\\' && !escaped;
    }
    Ok((s.to_string(), ""))
}

// -- String ------------------------------------------------------------------

/// Split `text` into words, shell style, with `name` as `argv[0]`.
///
/// Words are separated by blanks. Single or double quotes group blanks
/// into a word and are removed. A backslash makes the next character
/// literal, inside quotes or not.
pub fn args_from_str(text: &str, name: &str) -> Result<ArgList> {
    let mut args = vec![name.to_string()];
    let mut chars = text.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut word = String::new();
        while let Some(c) = chars.next() {
            match c {
                '"' | '\'' => {
                    let quote = c;
                    let mut closed = false;
                    let mut escaped = false;
                    for q in chars.by_ref() {
                        if q == quote && !escaped {
                            closed = true;
                            break;
                        }
                        if q == '\\' && !escaped {
                            escaped = true;
                            continue;
                        }
                        word.push(q);
                        escaped = false;
                    }
                    if !closed {
                        return Err(ParseError::Source(format!("{}: unmatched {}", name, quote)));
                    }
                }
                '\\' => {
                    if let Some(next) = chars.next() {
                        word.push(next);
                    }
                }
                c if c.is_whitespace() => break,
                c => word.push(c),
            }
        }
        args.push(word);
    }

    tracing::debug!(source = name, count = args.len() - 1, "split argument string");
    Ok(ArgList(args))
}
