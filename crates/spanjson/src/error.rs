use core::fmt;

use thiserror::Error;

use crate::node::Kind;

/// A JSON document failed to parse.
///
/// The node passed to [`NodeId::parse_body`](crate::NodeId::parse_body) is
/// left in [`Kind::Error`] carrying [`SyntaxError::message`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{source} at {line}:{column}")]
pub struct ParseError {
    pub(crate) source: SyntaxError,
    /// Byte offset into the input where the failure was detected.
    pub offset: usize,
    /// One-based line of `offset`.
    pub line: usize,
    /// One-based column (in bytes) of `offset`.
    pub column: usize,
}

impl ParseError {
    pub(crate) fn new(source: SyntaxError, input: &[u8], offset: usize) -> Self {
        let offset = offset.min(input.len());
        let consumed = &input[..offset];
        let line = 1 + consumed.iter().filter(|&&b| b == b'\n').count();
        let line_start = consumed
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |nl| nl + 1);

        Self {
            source,
            offset,
            line,
            column: 1 + offset - line_start,
        }
    }

    /// The underlying syntax error.
    #[must_use]
    pub fn syntax_error(&self) -> SyntaxError {
        self.source
    }
}

/// Everything that can go wrong while parsing, one variant per message that
/// ends up on an error node.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxError {
    UnexpectedEnd,
    UnexpectedCharacter,
    InvalidToken,
    MalformedNumber,
    UnterminatedString,
    KeyNotFound,
    UnterminatedKey,
    InvalidKeyEscape,
    MissingColon,
    InvalidSeparator,
    UnterminatedObject,
    UnterminatedArray,
    DepthLimitExceeded,
    OutOfMemory,
    TrailingCharacters,
    StaleHandle,
    KeyTarget,
}

impl SyntaxError {
    /// The human readable text stored on the failed node.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::UnexpectedEnd => "Element not found before end of document",
            Self::UnexpectedCharacter => "Unexpected character at start of element",
            Self::InvalidToken => "Invalid token",
            Self::MalformedNumber => "Malformed number",
            Self::UnterminatedString => "String not terminated before end of document",
            Self::KeyNotFound => "Key not found in object",
            Self::UnterminatedKey => "Key not terminated before end of document",
            Self::InvalidKeyEscape => "Key contains incorrectly escaped characters",
            Self::MissingColon => "Invalid char after key",
            Self::InvalidSeparator => "Invalid separator",
            Self::UnterminatedObject => "End of document reached before end of object",
            Self::UnterminatedArray => "End of document reached before end of array",
            Self::DepthLimitExceeded => "Maximum nesting depth exceeded",
            Self::OutOfMemory => "Failed to allocate element",
            Self::TrailingCharacters => "Unexpected content after end of document",
            Self::StaleHandle => "Element does not belong to this arena",
            Self::KeyTarget => "Cannot parse a value into an object key",
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A backslash sequence could not be decoded.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeError {
    #[error("unknown escape character '{}'", as_char(.0))]
    UnknownEscape(u8),
    #[error("backslash at end of string")]
    TrailingBackslash,
    #[error("unicode escape sequence ended early")]
    TruncatedUnicode,
    #[error("invalid unicode escape sequence at character: '{}'", as_char(.0))]
    InvalidHexDigit(u8),
    #[error("invalid surrogate in unicode escape sequence \\u{0:04X}")]
    InvalidSurrogate(u16),
}

fn as_char(byte: &u8) -> char {
    char::from(*byte)
}

/// Which of the two arena pools ran out of memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Nodes,
    Strings,
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Pool::Nodes => "node",
            Pool::Strings => "string",
        })
    }
}

/// The arena could not reserve another block.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("failed to allocate {pool} storage")]
pub struct AllocError {
    pub pool: Pool,
}

/// Reasons a tree query or mutation was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    #[error("expected a {expected} node, found {found}")]
    KindMismatch { expected: Kind, found: Kind },
    #[error("a {0} node cannot be used as a value")]
    InvalidValue(Kind),
    #[error("node handle does not belong to the current arena generation")]
    StaleHandle,
    #[error("node is already linked into a tree")]
    AlreadyAttached,
    #[error("a node cannot be linked under itself or its own descendants")]
    CreatesCycle,
    #[error("number text does not parse as the requested type")]
    InvalidNumber,
    #[error("number is not finite")]
    NonFiniteNumber,
    #[error(transparent)]
    Escape(#[from] EscapeError),
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

/// The serializer met a tree it cannot write.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializeError {
    #[error("a {0} node cannot be serialized as a value")]
    UnexpectedKind(Kind),
    #[error("key has no value")]
    MissingValue,
    #[error("node handle does not belong to the current arena generation")]
    StaleHandle,
    #[error("failed to write to the output")]
    Write(#[from] fmt::Error),
}
