//! Pretty-printed JSON output.
//!
//! The layout is fixed: two spaces per nesting level, one member or element
//! per line, `"name": value` with a single space after the colon, and `{}` or
//! `[]` for empty containers. Strings are written from their escaped form
//! when it is known and escaped on the fly otherwise, so serializing never
//! allocates.
//!
//! The parser does not validate UTF-8, but [`fmt::Write`] only takes text:
//! each invalid sequence in a string or key is written as U+FFFD. The bytes
//! in the arena, and [`NodeId::get_escaped_string`], are left untouched.

use alloc::string::String;
use core::fmt;

use crate::{
    Arena, NodeId,
    error::SerializeError,
    escape::write_escaped,
    node::{NodeBody, Text},
    span::Span,
};

const INDENT: &str = "  ";

struct Serializer<'a, 'src, W> {
    arena: &'a Arena<'src>,
    out: &'a mut W,
}

impl<'src, W: fmt::Write> Serializer<'_, 'src, W> {
    fn indent(&mut self, level: usize) -> fmt::Result {
        for _ in 0..level {
            self.out.write_str(INDENT)?;
        }
        Ok(())
    }

    fn quoted(&mut self, raw: Option<Span<'src>>, clean: Option<Span<'src>>) -> fmt::Result {
        self.out.write_char('"')?;
        match (raw, clean) {
            (Some(raw), _) => write!(self.out, "{}", self.arena.resolve(raw))?,
            (None, Some(clean)) => write_escaped(self.arena.resolve(clean), self.out)?,
            (None, None) => {}
        }
        self.out.write_char('"')
    }

    fn value(&mut self, node: NodeId, level: usize) -> Result<(), SerializeError> {
        let body = node
            .body(self.arena)
            .map_err(|_| SerializeError::StaleHandle)?;

        match body {
            NodeBody::String(Text { raw, clean }) => self.quoted(raw, clean)?,
            NodeBody::Number(digits) => write!(self.out, "{}", self.arena.resolve(digits))?,
            NodeBody::Null => self.out.write_str("null")?,
            NodeBody::True => self.out.write_str("true")?,
            NodeBody::False => self.out.write_str("false")?,
            NodeBody::Array(list) if list.count == 0 => self.out.write_str("[]")?,
            NodeBody::Object(list) if list.count == 0 => self.out.write_str("{}")?,
            NodeBody::Array(_) => {
                self.out.write_str("[\n")?;
                for (index, element) in node.children(self.arena).enumerate() {
                    if index > 0 {
                        self.out.write_str(",\n")?;
                    }
                    self.indent(level + 1)?;
                    self.value(element, level + 1)?;
                }
                self.out.write_char('\n')?;
                self.indent(level)?;
                self.out.write_char(']')?;
            }
            NodeBody::Object(_) => {
                self.out.write_str("{\n")?;
                for (index, key) in node.children(self.arena).enumerate() {
                    if index > 0 {
                        self.out.write_str(",\n")?;
                    }
                    self.indent(level + 1)?;
                    self.member(key, level + 1)?;
                }
                self.out.write_char('\n')?;
                self.indent(level)?;
                self.out.write_char('}')?;
            }
            other @ (NodeBody::Key { .. } | NodeBody::Error { .. }) => {
                return Err(SerializeError::UnexpectedKind(other.kind()));
            }
        }
        Ok(())
    }

    fn member(&mut self, key: NodeId, level: usize) -> Result<(), SerializeError> {
        let body = key
            .body(self.arena)
            .map_err(|_| SerializeError::StaleHandle)?;
        let NodeBody::Key { name, raw, value } = body else {
            return Err(SerializeError::UnexpectedKind(body.kind()));
        };
        let value = value.ok_or(SerializeError::MissingValue)?;

        self.quoted(raw, Some(name))?;
        self.out.write_str(": ")?;
        self.value(value, level)
    }
}

impl NodeId {
    /// Writes this value as indented JSON, as if it were nested `level` deep.
    ///
    /// # Errors
    ///
    /// [`SerializeError::UnexpectedKind`] when a key or error node sits where
    /// a value belongs, [`SerializeError::MissingValue`] for a key without a
    /// value, and [`SerializeError::Write`] if `out` fails.
    ///
    /// Text that is not valid UTF-8 is written lossily, with U+FFFD for each
    /// invalid sequence.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use spanjson::Arena;
    ///
    /// let mut arena = Arena::new();
    /// let root = arena.parse(r#"{"a": [1, "x"], "b": {}}"#).unwrap();
    ///
    /// let mut out = String::new();
    /// root.serialize(&arena, &mut out, 0).unwrap();
    /// assert_eq!(out, "{\n  \"a\": [\n    1,\n    \"x\"\n  ],\n  \"b\": {}\n}");
    /// ```
    pub fn serialize<W: fmt::Write>(
        self,
        arena: &Arena<'_>,
        out: &mut W,
        level: usize,
    ) -> Result<(), SerializeError> {
        Serializer { arena, out }.value(self, level)
    }

    /// Serializes this value into a new `String`.
    ///
    /// # Errors
    ///
    /// As [`NodeId::serialize`].
    pub fn to_json_string(self, arena: &Arena<'_>) -> Result<String, SerializeError> {
        let mut out = String::new();
        self.serialize(arena, &mut out, 0)?;
        Ok(out)
    }
}
