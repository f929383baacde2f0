//! Error type for parse calls.

use thiserror::Error;

/// Why a parse call failed.
///
/// Token-level problems are accumulated over the whole scan, so
/// [`ParseError::Options`] may carry several messages; `Display` joins
/// them with newlines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The argv entry point requires `TIMESTEN_HOME`.
    #[error("TIMESTEN_HOME environment variable not set")]
    HomeNotSet,

    /// The option table itself was invalid. Nothing was parsed.
    #[error("{}", .0.join("\n"))]
    Registration(Vec<String>),

    /// One or more tokens could not be handled.
    #[error("{}", .0.join("\n"))]
    Options(Vec<String>),

    /// The file or string adapter could not build an argument list.
    #[error("{0}")]
    Source(String),
}

impl ParseError {
    /// The individual diagnostics, in the order they were produced.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ParseError::Registration(msgs) | ParseError::Options(msgs) => msgs.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// Result alias for parse calls.
pub type Result<T> = std::result::Result<T, ParseError>;
